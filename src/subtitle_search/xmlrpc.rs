//! Just enough XML-RPC to talk to OpenSubtitles.

use super::xml::{Element, parse_document};
use quick_xml::escape::escape;
use thiserror::Error;

/// Errors from encoding or decoding XML-RPC messages
#[derive(Debug, Error, PartialEq)]
pub(super) enum XmlRpcError {
    /// The body is not well-formed XML
    #[error("{0}")]
    Xml(String),

    /// The server answered with a fault
    #[error("fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// Well-formed XML that is not a valid XML-RPC response
    #[error("malformed XML-RPC response: {0}")]
    Malformed(String),
}

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    Double(f64),
    Array(Vec<Value>),
    Struct(Vec<(String, Value)>),
    Nil,
}

impl Value {
    /// Looks up a struct member by name
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Renders scalars as text; OpenSubtitles is loose about numbers vs strings
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Double(d) => Some(d.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Encodes a method call.
pub(super) fn method_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Int(i) => out.push_str(&format!("<int>{}</int>", i)),
        Value::Bool(b) => out.push_str(&format!("<boolean>{}</boolean>", u8::from(*b))),
        Value::Double(d) => out.push_str(&format!("<double>{}</double>", d)),
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
        Value::Nil => out.push_str("<nil/>"),
    }
    out.push_str("</value>");
}

/// Decodes a method response into its single return value.
///
/// A fault response is returned as [`XmlRpcError::Fault`].
pub(super) fn parse_response(xml: &str) -> Result<Value, XmlRpcError> {
    let document = parse_document(xml).map_err(XmlRpcError::Xml)?;
    let response = document
        .child("methodResponse")
        .ok_or_else(|| XmlRpcError::Malformed("missing methodResponse".to_string()))?;

    if let Some(fault) = response.child("fault") {
        let value = fault
            .child("value")
            .ok_or_else(|| XmlRpcError::Malformed("fault without value".to_string()))
            .and_then(parse_value)?;
        return Err(XmlRpcError::Fault {
            code: match value.get("faultCode") {
                Some(Value::Int(code)) => *code,
                _ => 0,
            },
            message: value
                .get("faultString")
                .and_then(Value::as_text)
                .unwrap_or_default(),
        });
    }

    response
        .child("params")
        .and_then(|params| params.child("param"))
        .and_then(|param| param.child("value"))
        .ok_or_else(|| XmlRpcError::Malformed("missing return value".to_string()))
        .and_then(parse_value)
}

fn parse_value(value: &Element) -> Result<Value, XmlRpcError> {
    // A value without a type element is a string
    let Some(typed) = value.children.first() else {
        return Ok(Value::String(value.text.clone()));
    };

    match typed.name.as_str() {
        "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(typed.text.clone())),
        "int" | "i4" | "i8" => typed
            .text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| XmlRpcError::Malformed(format!("invalid int '{}'", typed.text))),
        "double" => typed
            .text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|_| XmlRpcError::Malformed(format!("invalid double '{}'", typed.text))),
        "boolean" => match typed.text.trim() {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(XmlRpcError::Malformed(format!("invalid boolean '{}'", other))),
        },
        "nil" => Ok(Value::Nil),
        "array" => typed
            .child("data")
            .map(|data| {
                data.children_named("value")
                    .map(parse_value)
                    .collect::<Result<Vec<_>, _>>()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(Value::Array),
        "struct" => typed
            .children_named("member")
            .map(|member| -> Result<(String, Value), XmlRpcError> {
                let name = member.child_text("name");
                let value = member
                    .child("value")
                    .ok_or_else(|| {
                        XmlRpcError::Malformed(format!("member '{}' without value", name))
                    })
                    .and_then(parse_value)?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Struct),
        other => Err(XmlRpcError::Malformed(format!("unsupported type '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_call_encoding() {
        let body = method_call(
            "LogIn",
            &[
                Value::String("".to_string()),
                Value::String("a<b".to_string()),
                Value::Struct(vec![("season".to_string(), Value::Int(2))]),
            ],
        );

        assert!(
            body.starts_with("<?xml version=\"1.0\"?><methodCall><methodName>LogIn</methodName>")
        );
        assert!(body.contains("<param><value><string></string></value></param>"));
        assert!(body.contains("<string>a&lt;b</string>"));
        assert!(body.contains(
            "<struct><member><name>season</name><value><int>2</int></value></member></struct>"
        ));
        assert!(body.ends_with("</params></methodCall>"));
    }

    #[test]
    fn test_parse_struct_response() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <methodResponse><params><param><value><struct>
              <member><name>token</name><value><string>abc123</string></value></member>
              <member><name>status</name><value><string>200 OK</string></value></member>
              <member><name>seconds</name><value><double>0.004</double></value></member>
              <member><name>data</name><value><array><data>
                <value><struct><member><name>SeriesSeason</name><value>1</value></member></struct></value>
                <value><int>7</int></value>
              </data></array></value></member>
              <member><name>more</name><value><boolean>0</boolean></value></member>
            </struct></value></param></params></methodResponse>"#;

        let value = parse_response(xml).unwrap();
        assert_eq!(value.get("token"), Some(&Value::String("abc123".to_string())));
        assert_eq!(value.get("status").and_then(Value::as_text).as_deref(), Some("200 OK"));
        assert_eq!(value.get("more"), Some(&Value::Bool(false)));

        let Some(Value::Array(data)) = value.get("data") else {
            panic!("data is not an array");
        };
        assert_eq!(data.len(), 2);
        assert_eq!(
            data[0].get("SeriesSeason").and_then(Value::as_text).as_deref(),
            Some("1")
        );
        assert_eq!(data[1], Value::Int(7));
    }

    #[test]
    fn test_parse_fault() {
        let xml = r#"<methodResponse><fault><value><struct>
              <member><name>faultCode</name><value><int>401</int></value></member>
              <member><name>faultString</name><value><string>Unauthorized</string></value></member>
            </struct></value></fault></methodResponse>"#;

        assert_eq!(
            parse_response(xml),
            Err(XmlRpcError::Fault {
                code: 401,
                message: "Unauthorized".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_non_xmlrpc() {
        assert!(matches!(
            parse_response("<html><body>down</body></html>"),
            Err(XmlRpcError::Malformed(_))
        ));
        assert!(matches!(parse_response("<methodResponse>"), Err(XmlRpcError::Xml(_))));
    }
}
