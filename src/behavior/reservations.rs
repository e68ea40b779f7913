//! Reserved keywords: `$defs` and `$comment`

use serde_json::Value;

use crate::behavior::{KeywordBehavior, ReservedBehavior};
use crate::builder::BuildContext;
use crate::error::Result;
use crate::schema::NodeIndex;

/// Definitions are compiled so references can reach them, but never applied
#[derive(Debug, Clone)]
pub struct Defs {
    pub schemas: Vec<(String, NodeIndex)>,
}

pub fn build_defs(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schemas = ctx.subschema_map(value, |_, name| Ok(name.to_string()))?;
    Ok(Some(KeywordBehavior::Reserved(ReservedBehavior::Defs(Defs { schemas }))))
}

pub fn build_comment(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let Some(comment) = value.as_str() else {
        return Err(ctx.invalid_type("string"));
    };
    Ok(Some(KeywordBehavior::Reserved(ReservedBehavior::Comment(comment.to_string()))))
}

#[cfg(test)]
mod tests {
    use crate::error::CompileError;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_defs_are_not_applied() {
        let schema = Schema::compile(&json!({"$defs": {"never": false}, "$comment": "ok"})).unwrap();
        assert!(schema.is_valid(&json!("anything")));
    }

    #[test]
    fn test_defs_must_hold_schemas() {
        let err = Schema::compile(&json!({"$defs": {"a": 1}})).unwrap_err();
        assert_eq!(err.location().to_string(), "/$defs/a");
        assert!(matches!(Schema::compile(&json!({"$comment": 5})), Err(CompileError::InvalidType { .. })));
    }
}
