use serde_json::{Map, Value, json};

/// 日志属性清洗：限制字符串长度、数组元素数与嵌套深度，避免超大日志
#[derive(Clone, Copy, Debug)]
pub struct LogDataSanitizer {
    /// 字符串最大字符数，超出部分以 `...` 截断
    pub max_string_len: usize,
    /// 数组保留的最大元素数
    pub max_items: usize,
    /// 最大展开深度，更深的对象/数组仅保留摘要
    pub max_depth: usize,
}

impl Default for LogDataSanitizer {
    fn default() -> Self {
        Self {
            max_string_len: 500,
            max_items: 5,
            max_depth: 2,
        }
    }
}

impl LogDataSanitizer {
    pub fn sanitize(&self, value: Value) -> Value {
        self.sanitize_at(value, 0)
    }

    fn sanitize_at(&self, value: Value, depth: usize) -> Value {
        match value {
            Value::String(s) => Value::String(self.truncate(s)),
            Value::Array(items) if depth >= self.max_depth => {
                Value::String(format!("<array: {} items>", items.len()))
            }
            Value::Array(items) => {
                let len = items.len();
                let kept: Vec<Value> = items
                    .into_iter()
                    .take(self.max_items)
                    .map(|v| self.sanitize_at(v, depth + 1))
                    .collect();
                if len > self.max_items {
                    json!({
                        "_length": len,
                        "_elements": kept,
                        "_truncated": true,
                    })
                } else {
                    Value::Array(kept)
                }
            }
            Value::Object(map) if depth >= self.max_depth => {
                Value::String(format!("<object: {} keys>", map.len()))
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, self.sanitize_at(v, depth + 1)))
                    .collect::<Map<String, Value>>(),
            ),
            other => other,
        }
    }

    fn truncate(&self, s: String) -> String {
        if s.chars().count() <= self.max_string_len {
            return s;
        }
        let mut out: String = s.chars().take(self.max_string_len).collect();
        out.push_str("...");
        out
    }
}
