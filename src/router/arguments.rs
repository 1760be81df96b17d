//! Positional call arguments passed to handler methods.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::explorer::ParamOrder;

/// Positions of the payload event emission `(context, error, payload)`.
pub const CONTEXT_POSITION: usize = 0;
pub const ERROR_POSITION: usize = 1;
pub const PAYLOAD_POSITION: usize = 2;

/// Arguments of one handler call.
///
/// Each position holds a value or is absent. Absent differs from
/// `Value::Null`: a payload event reporting no error passes `Null` at the
/// error position, while a position no role asked for stays absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    slots: Vec<Option<Value>>,
}

impl Arguments {
    /// Create from explicit slots.
    pub fn new(slots: Vec<Option<Value>>) -> Self {
        Self { slots }
    }

    /// Every value present, in order.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            slots: values.into_iter().map(Some).collect(),
        }
    }

    /// Lay out a payload emission according to `order`.
    ///
    /// The emission is read as `(context, error, payload)`; elements the
    /// client did not send are absent.
    pub fn for_payload(order: &ParamOrder, emission: &[Value]) -> Self {
        let mut slots = vec![None; order.width()];
        let mut place = |position: Option<usize>, source: usize| {
            if let Some(position) = position {
                slots[position] = emission.get(source).cloned();
            }
        };

        place(order.context, CONTEXT_POSITION);
        place(order.payload, PAYLOAD_POSITION);
        place(order.error, ERROR_POSITION);

        Self { slots }
    }

    /// Number of positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Value at `index`, `None` if absent or out of range.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Whether `index` is absent or out of range.
    pub fn is_absent(&self, index: usize) -> bool {
        self.get(index).is_none()
    }

    /// Deserialize the value at `index`. Absent positions yield `Ok(None)`.
    pub fn decode<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>> {
        match self.get(index) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    /// Iterate positions in order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.slots.iter().map(Option::as_ref)
    }

    /// Take the slots.
    pub fn into_inner(self) -> Vec<Option<Value>> {
        self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ParamRole;
    use serde::Deserialize;
    use serde_json::json;

    fn order(roles: &[(ParamRole, usize)]) -> ParamOrder {
        let mut order = ParamOrder::default();
        for (role, index) in roles {
            order.set(*role, *index);
        }
        order
    }

    #[test]
    fn test_payload_reordered_by_roles() {
        let order = order(&[
            (ParamRole::Payload, 0),
            (ParamRole::Context, 1),
            (ParamRole::Error, 2),
        ]);
        let emission = [json!("X"), Value::Null, json!({"a": 1})];

        let args = Arguments::for_payload(&order, &emission);

        assert_eq!(
            args.into_inner(),
            vec![Some(json!({"a": 1})), Some(json!("X")), Some(Value::Null)]
        );
    }

    #[test]
    fn test_unaddressed_positions_absent() {
        let order = order(&[(ParamRole::Payload, 2)]);
        let emission = [json!("ctx"), Value::Null, json!(7)];

        let args = Arguments::for_payload(&order, &emission);

        assert_eq!(args.len(), 3);
        assert!(args.is_absent(0));
        assert!(args.is_absent(1));
        assert_eq!(args.get(2), Some(&json!(7)));
    }

    #[test]
    fn test_short_emission_leaves_absent() {
        let order = order(&[(ParamRole::Context, 0), (ParamRole::Payload, 1)]);
        let emission = [json!("ctx")];

        let args = Arguments::for_payload(&order, &emission);

        assert_eq!(args.get(0), Some(&json!("ctx")));
        assert!(args.is_absent(1));
    }

    #[test]
    fn test_no_roles_no_positions() {
        let args = Arguments::for_payload(&ParamOrder::default(), &[json!(1)]);
        assert!(args.is_empty());
    }

    #[test]
    fn test_decode() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Status {
            engine: String,
        }

        let args = Arguments::new(vec![Some(json!({"engine": "e1"})), None]);

        let status: Option<Status> = args.decode(0).unwrap();
        assert_eq!(
            status,
            Some(Status {
                engine: "e1".into()
            })
        );
        assert_eq!(args.decode::<Status>(1).unwrap(), None);
        assert!(args.decode::<u32>(0).is_err());
    }
}
