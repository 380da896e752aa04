//! Stateless record comparison.
//!
//! A `Comparator` is built from an `OrderMaker` alone and carries no other
//! state, so it can be cloned into worker threads freely.

use std::cmp::Ordering;

use crate::order::{compare_optional, OrderMaker};
use crate::types::Record;

#[derive(Debug, Clone)]
pub struct Comparator {
    order: OrderMaker,
}

impl Comparator {
    pub fn new(order: OrderMaker) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &OrderMaker {
        &self.order
    }

    /// Compare two records laid out the same way. `Less` means `a` sorts first.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for key in self.order.keys() {
            match compare_optional(a.get(key.attr), b.get(key.attr)) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

/// Compare two records with different layouts, key by key.
///
/// `left_order` and `right_order` must have the same length; the i-th key of
/// each names the attribute that is compared at step i.
pub fn compare_across(
    left: &Record,
    left_order: &OrderMaker,
    right: &Record,
    right_order: &OrderMaker,
) -> Ordering {
    for (l, r) in left_order.keys().iter().zip(right_order.keys()) {
        match compare_optional(left.get(l.attr), right.get(r.attr)) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::SortKey;
    use crate::schema::DataType;
    use crate::types::Scalar;

    fn rec(a: i32, b: &str) -> Record {
        Record::new(vec![Scalar::Int(a), Scalar::Str(b.into())])
    }

    #[test]
    fn compares_keys_in_order() {
        let cmp = Comparator::new(OrderMaker::new(vec![
            SortKey::new(1, DataType::String),
            SortKey::new(0, DataType::Int),
        ]));
        assert_eq!(cmp.compare(&rec(2, "a"), &rec(1, "b")), Ordering::Less);
        assert_eq!(cmp.compare(&rec(2, "a"), &rec(1, "a")), Ordering::Greater);
        assert_eq!(cmp.compare(&rec(1, "a"), &rec(1, "a")), Ordering::Equal);
    }

    #[test]
    fn agrees_with_sort_tuples() {
        let order = OrderMaker::new(vec![SortKey::new(0, DataType::Int)]);
        let cmp = Comparator::new(order.clone());
        let (a, b) = (rec(3, "x"), rec(4, "a"));
        assert_eq!(cmp.compare(&a, &b), order.extract(&a).cmp(&order.extract(&b)));
    }

    #[test]
    fn across_layouts() {
        let left_order = OrderMaker::new(vec![SortKey::new(1, DataType::String)]);
        let right_order = OrderMaker::new(vec![SortKey::new(0, DataType::String)]);
        let literal = Record::new(vec![Scalar::Str("b".into())]);
        assert_eq!(
            compare_across(&rec(9, "b"), &left_order, &literal, &right_order),
            Ordering::Equal
        );
        assert_eq!(
            compare_across(&rec(9, "c"), &left_order, &literal, &right_order),
            Ordering::Greater
        );
    }
}
