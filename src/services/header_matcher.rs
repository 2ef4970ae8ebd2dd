use crate::models::header::{HeaderSchema, QUESTION_TYPE_KEY};
use crate::models::question::QuestionRecord;
use serde_json::Value as JsonValue;
use std::borrow::Cow;

/// Resolves which field of a loosely keyed question record belongs to a
/// canonical column.
///
/// Matching runs in two stages, both by substring containment:
/// 1. the header (line breaks removed) is reduced to the first alias key it
///    contains, in schema order;
/// 2. the first record key (in insertion order) containing that alias wins.
///
/// Short aliases such as `"A"` also match any record key that merely contains
/// the letter. Records whose keys collide this way resolve to the earliest
/// such key.
#[derive(Debug, Clone, Copy)]
pub struct HeaderMatcher<'s> {
    schema: &'s HeaderSchema,
}

impl<'s> HeaderMatcher<'s> {
    pub fn new(schema: &'s HeaderSchema) -> Self {
        Self { schema }
    }

    /// Stage one: the alias key used to search record keys for `header`.
    /// Falls back to the flattened header text when no alias is contained.
    pub fn match_key<'h>(&self, header: &'h str) -> Cow<'h, str> {
        let target: Cow<'h, str> = if header.contains(['\n', '\r']) {
            Cow::Owned(header.replace(['\n', '\r'], ""))
        } else {
            Cow::Borrowed(header)
        };

        match self
            .schema
            .columns()
            .iter()
            .find(|column| target.contains(column.key))
        {
            Some(column) => Cow::Borrowed(column.key),
            None => target,
        }
    }

    /// Stage two: the value the record intends for `header`, if any.
    pub fn resolve<'r>(&self, header: &str, record: &'r QuestionRecord) -> Option<&'r JsonValue> {
        let target = self.match_key(header);
        record
            .iter()
            .find(|(key, _)| key.contains(target.as_ref()))
            .map(|(_, value)| value)
    }

    pub fn question_type<'r>(&self, record: &'r QuestionRecord) -> Option<&'r JsonValue> {
        let label = self.schema.label_for(QUESTION_TYPE_KEY)?;
        self.resolve(label, record)
    }

    /// The question type as text, when the record carries one as a string.
    pub fn question_type_str<'r>(&self, record: &'r QuestionRecord) -> Option<&'r str> {
        self.question_type(record).and_then(JsonValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> QuestionRecord {
        serde_json::from_value(value).expect("record literal")
    }

    #[test]
    fn header_reduces_to_first_contained_alias() {
        let schema = HeaderSchema::standard();
        let matcher = HeaderMatcher::new(&schema);

        assert_eq!(matcher.match_key("题干（必填）"), "题干");
        assert_eq!(matcher.match_key("正确答案\n（必填）"), "正确答案");
        assert_eq!(matcher.match_key("选项E\n(勿删)"), "E");
        assert_eq!(matcher.match_key("难度"), "难度");
        assert_eq!(matcher.match_key("备注\n说明"), "备注说明");
    }

    #[test]
    fn exact_core_key_resolves() {
        let schema = HeaderSchema::standard();
        let matcher = HeaderMatcher::new(&schema);
        let q = record(json!({ "正确答案": "B", "解析": "because" }));

        assert_eq!(matcher.resolve("正确答案\n（必填）", &q), Some(&json!("B")));
        assert_eq!(matcher.resolve("解析\n（勿删）", &q), Some(&json!("because")));
        assert_eq!(matcher.resolve("章节\n（勿删）", &q), None);
    }

    #[test]
    fn decorated_and_varied_keys_resolve() {
        let schema = HeaderSchema::standard();
        let matcher = HeaderMatcher::new(&schema);
        let q = record(json!({
            "题干 (required)": "What is 2+2?",
            "题型 （必填）": "单选题",
            "选项 A": "3",
            "选项 B": "4",
        }));

        assert_eq!(matcher.resolve("题干（必填）", &q), Some(&json!("What is 2+2?")));
        assert_eq!(matcher.question_type_str(&q), Some("单选题"));
        assert_eq!(matcher.resolve("选项 A", &q), Some(&json!("3")));
        assert_eq!(matcher.resolve("选项 B", &q), Some(&json!("4")));
    }

    #[test]
    fn first_matching_record_key_wins() {
        let schema = HeaderSchema::standard();
        let matcher = HeaderMatcher::new(&schema);
        // "A" is contained in "Answer" before "选项A" is reached.
        let q = record(json!({ "Answer": "x", "选项A": "y" }));

        assert_eq!(matcher.resolve("选项 A", &q), Some(&json!("x")));
    }

    #[test]
    fn null_values_are_returned_as_null() {
        let schema = HeaderSchema::standard();
        let matcher = HeaderMatcher::new(&schema);
        let q = record(json!({ "难度": null }));

        assert_eq!(matcher.resolve("难度", &q), Some(&JsonValue::Null));
        assert_eq!(matcher.question_type(&q), None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let schema = HeaderSchema::standard();
        let matcher = HeaderMatcher::new(&schema);
        let q = record(json!({ "题干": "s", "题型": "判断题", "正确答案": "对" }));

        for label in schema.labels() {
            assert_eq!(matcher.resolve(label, &q), matcher.resolve(label, &q));
        }
    }
}
