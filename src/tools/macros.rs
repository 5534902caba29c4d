//! Tool Definition Macros
//!
//! Simplifies tool creation by reducing boilerplate

/// Define tool metadata using a declarative syntax
///
/// # Example
/// ```
/// let metadata = osabridge::tool_metadata! {
///     name: "notes_get",
///     description: "Fetch a note by its exact title",
///     parameters: [
///         {
///             name: "title",
///             type: "string",
///             description: "Exact title of the note",
///             required: true
///         },
///         {
///             name: "days",
///             type: "number",
///             description: "Lookahead in days",
///             required: false,
///             default: 7
///         }
///     ]
/// };
/// assert_eq!(metadata.parameters.len(), 2);
/// ```
#[macro_export]
macro_rules! tool_metadata {
    (
        name: $name:expr,
        description: $description:expr,
        parameters: [
            $(
                {
                    name: $param_name:expr,
                    type: $param_type:expr,
                    description: $param_desc:expr,
                    required: $param_required:expr
                    $(, default: $param_default:expr)?
                }
            ),* $(,)?
        ]
    ) => {
        $crate::tools::ToolMetadata {
            name: $name.to_string(),
            description: $description.to_string(),
            parameters: vec![
                $(
                    $crate::tools::ToolParameter {
                        name: $param_name.to_string(),
                        param_type: $param_type.to_string(),
                        description: $param_desc.to_string(),
                        required: $param_required,
                        default: {
                            #[allow(unused_mut)]
                            let mut default: Option<$crate::serde_json::Value> = None;
                            $( default = Some($crate::serde_json::Value::from($param_default)); )?
                            default
                        },
                    }
                ),*
            ],
        }
    };
}

/// Validate required string parameter
#[macro_export]
macro_rules! validate_required_string {
    ($args:expr, $param:expr) => {
        $args[$param].as_str().ok_or_else(|| {
            anyhow::anyhow!("'{}' parameter is required and must be a string", $param)
        })?
    };
}

/// Optional string parameter; absent, null and blank all read as `None`
#[macro_export]
macro_rules! validate_optional_string {
    ($args:expr, $param:expr) => {
        match &$args[$param] {
            $crate::serde_json::Value::Null => None,
            value => {
                let text = value.as_str().ok_or_else(|| {
                    anyhow::anyhow!("'{}' parameter must be a string", $param)
                })?;
                if text.trim().is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
        }
    };
}

/// Optional integer parameter; whole-valued floats such as `7.0` are accepted
#[macro_export]
macro_rules! validate_optional_number {
    ($args:expr, $param:expr) => {
        match &$args[$param] {
            $crate::serde_json::Value::Null => None,
            value => Some(
                value
                    .as_i64()
                    .or_else(|| {
                        value
                            .as_f64()
                            .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                            .map(|f| f as i64)
                    })
                    .ok_or_else(|| {
                        anyhow::anyhow!("'{}' parameter must be a whole number", $param)
                    })?,
            ),
        }
    };
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn test_tool_metadata_macro() {
        let metadata = tool_metadata! {
            name: "test_tool",
            description: "A test tool",
            parameters: [
                {
                    name: "param1",
                    type: "string",
                    description: "First parameter",
                    required: true
                },
                {
                    name: "param2",
                    type: "number",
                    description: "Second parameter",
                    required: false,
                    default: 90
                }
            ]
        };

        assert_eq!(metadata.name, "test_tool");
        assert_eq!(metadata.description, "A test tool");
        assert_eq!(metadata.parameters.len(), 2);
        assert_eq!(metadata.parameters[0].name, "param1");
        assert!(metadata.parameters[0].required);
        assert_eq!(metadata.parameters[0].default, None);
        assert!(!metadata.parameters[1].required);
        assert_eq!(metadata.parameters[1].default, Some(json!(90)));
    }

    fn read_optional(args: serde_json::Value) -> Result<Option<String>> {
        Ok(validate_optional_string!(args, "folder").map(str::to_string))
    }

    #[test]
    fn test_validate_optional_string() {
        assert_eq!(read_optional(json!({})).unwrap(), None);
        assert_eq!(read_optional(json!({"folder": "  "})).unwrap(), None);
        assert_eq!(
            read_optional(json!({"folder": "Work"})).unwrap().as_deref(),
            Some("Work")
        );
        assert!(read_optional(json!({"folder": 3})).is_err());
    }
}
