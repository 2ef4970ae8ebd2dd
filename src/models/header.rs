/// One fixed spreadsheet column: the short alias used for matching, the
/// decorated label written into the header row, and the column width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderColumn {
    pub key: &'static str,
    pub label: &'static str,
    pub width: f64,
}

// Order is matching priority as well as column order.
const STANDARD_COLUMNS: [HeaderColumn; 14] = [
    HeaderColumn { key: "题干", label: "题干（必填）", width: 50.0 },
    HeaderColumn { key: "题型", label: "题型 （必填）", width: 15.0 },
    HeaderColumn { key: "A", label: "选项 A", width: 20.0 },
    HeaderColumn { key: "B", label: "选项 B", width: 20.0 },
    HeaderColumn { key: "C", label: "选项 C", width: 20.0 },
    HeaderColumn { key: "D", label: "选项 D", width: 20.0 },
    HeaderColumn { key: "E", label: "选项E\n(勿删)", width: 20.0 },
    HeaderColumn { key: "F", label: "选项F\n(勿删)", width: 20.0 },
    HeaderColumn { key: "G", label: "选项G\n(勿删)", width: 20.0 },
    HeaderColumn { key: "H", label: "选项H\n(勿删)", width: 20.0 },
    HeaderColumn { key: "正确答案", label: "正确答案\n（必填）", width: 15.0 },
    HeaderColumn { key: "解析", label: "解析\n（勿删）", width: 30.0 },
    HeaderColumn { key: "章节", label: "章节\n（勿删）", width: 20.0 },
    HeaderColumn { key: "难度", label: "难度", width: 10.0 },
];

pub const QUESTION_TYPE_KEY: &str = "题型";

/// The canonical header row together with its alias table. Built once at
/// startup and shared read-only by the matcher and the exporter.
#[derive(Debug, Clone)]
pub struct HeaderSchema {
    columns: &'static [HeaderColumn],
}

impl HeaderSchema {
    pub fn standard() -> Self {
        Self {
            columns: &STANDARD_COLUMNS,
        }
    }

    pub fn columns(&self) -> &[HeaderColumn] {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.label)
    }

    /// Decorated label for a short alias key, e.g. `"题型"` -> `"题型 （必填）"`.
    pub fn label_for(&self, key: &str) -> Option<&'static str> {
        self.columns.iter().find(|c| c.key == key).map(|c| c.label)
    }
}

impl Default for HeaderSchema {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_schema_is_fixed() {
        let schema = HeaderSchema::standard();
        assert_eq!(schema.len(), 14);
        let labels: Vec<_> = schema.labels().collect();
        assert_eq!(labels.first(), Some(&"题干（必填）"));
        assert_eq!(labels.last(), Some(&"难度"));
        assert_eq!(schema.label_for(QUESTION_TYPE_KEY), Some("题型 （必填）"));
        assert_eq!(schema.label_for("选项"), None);
    }
}
