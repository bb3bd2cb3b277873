use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// A typed argument to a contract read function.
///
/// 128-bit integers are written as decimal strings since JSON numbers
/// cannot carry them losslessly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Uint(u128),
    Int(i128),
    Bool(bool),
    Principal(String),
    StringAscii(String),
    StringUtf8(String),
    Buffer(Vec<u8>),
    None,
    Some(Box<CallArg>),
}

impl CallArg {
    pub fn uint(value: impl Into<u128>) -> Self {
        CallArg::Uint(value.into())
    }

    pub fn principal(value: impl Into<String>) -> Self {
        CallArg::Principal(value.into())
    }

    pub fn some(value: CallArg) -> Self {
        CallArg::Some(Box::new(value))
    }

    pub fn type_name(&self) -> &'static str {
        use CallArg::*;
        match self {
            Uint(_) => "uint",
            Int(_) => "int",
            Bool(_) => "bool",
            Principal(_) => "principal",
            StringAscii(_) => "string-ascii",
            StringUtf8(_) => "string-utf8",
            Buffer(_) => "buffer",
            None => "none",
            Some(_) => "some",
        }
    }

    pub fn to_json(&self) -> Value {
        use CallArg::*;
        let value = match self {
            Uint(n) => Value::String(n.to_string()),
            Int(n) => Value::String(n.to_string()),
            Bool(b) => Value::Bool(*b),
            Principal(s) | StringAscii(s) | StringUtf8(s) => {
                Value::String(s.clone())
            }
            Buffer(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
            None => return json!({ "type": self.type_name() }),
            Some(inner) => inner.to_json(),
        };
        json!({ "type": self.type_name(), "value": value })
    }
}

impl Serialize for CallArg {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Key under which a call is queued, `<function>:<json args>`.
pub fn admission_key(function_name: &str, args: &[CallArg]) -> String {
    let args = Value::Array(args.iter().map(CallArg::to_json).collect());
    format!("{function_name}:{args}")
}
