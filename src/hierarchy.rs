use serde::Deserialize;

/// One member row of a model's dimension hierarchy.
///
/// The hierarchy itself is encoded by the `parent` links; members with no
/// parent are roots of their dimension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DimensionMember {
    pub dimension: String,
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    /// Rollup operator relative to the parent, typically `+` or `-`.
    #[serde(default)]
    pub operator: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HierarchyReply {
    #[serde(default)]
    pub(crate) data: Vec<DimensionMember>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_parse_with_optional_fields() {
        let reply: HierarchyReply = serde_json::from_str(
            r#"{
                "data": [
                    {"dimension": "Accounts", "name": "Revenue", "operator": "+", "parent": "P&L"},
                    {"dimension": "Accounts", "name": "P&L"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(reply.data.len(), 2);
        assert_eq!(reply.data[0].parent.as_deref(), Some("P&L"));
        assert!(reply.data[1].parent.is_none());
        assert!(reply.data[1].alias.is_none());
    }
}
