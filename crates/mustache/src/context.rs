//! Context stack for variable resolution during template rendering.

use crate::value::Value;

/// Stack of data frames searched most-recently-pushed first
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    frames: Vec<Value>,
}

impl ContextStack {
    /// Build the initial stack. The first context is the most specific one
    /// and ends up on top.
    pub fn new(contexts: impl IntoIterator<Item = Value>) -> Self {
        let mut frames: Vec<Value> = contexts.into_iter().collect();
        frames.reverse();
        Self { frames }
    }

    pub fn push(&mut self, frame: Value) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.frames.pop()
    }

    /// The current top-of-stack value, or null for an empty stack
    pub fn top(&self) -> Value {
        self.frames.last().cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Resolve a possibly dotted name. `None` is a miss.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        resolve(&self.frames, name)
    }
}

/// Each segment after the first of a dotted name resolves only against the
/// value found for the segment before it.
fn resolve(frames: &[Value], name: &str) -> Option<Value> {
    // `.` is the current value itself, even when that value is null.
    if name == "." {
        return frames.last().cloned();
    }
    if let Some((head, rest)) = name.split_once('.') {
        let parent = resolve(frames, head)?;
        return resolve(std::slice::from_ref(&parent), rest);
    }

    frames
        .iter()
        .rev()
        .find_map(|frame| resolve_in_frame(frame, name))
}

fn resolve_in_frame(frame: &Value, name: &str) -> Option<Value> {
    if let Some(value) = frame.call(name) {
        return Some(value);
    }
    if frame.is_keyed() {
        return frame.field(name);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Resolve;
    use serde_json::json;

    fn stack(contexts: Vec<serde_json::Value>) -> ContextStack {
        ContextStack::new(contexts.into_iter().map(Value::from))
    }

    #[test]
    fn test_first_context_searched_first() {
        let ctx = stack(vec![json!({"name": "inner"}), json!({"name": "outer", "other": 1})]);
        assert_eq!(ctx.lookup("name"), Some(Value::from("inner")));
        assert_eq!(ctx.lookup("other"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_pushed_frame_shadows() {
        let mut ctx = stack(vec![json!({"name": "root"})]);
        ctx.push(Value::from(json!({"name": "pushed"})));
        assert_eq!(ctx.lookup("name"), Some(Value::from("pushed")));
        ctx.pop();
        assert_eq!(ctx.lookup("name"), Some(Value::from("root")));
    }

    #[test]
    fn test_miss() {
        let ctx = stack(vec![json!({"a": 1})]);
        assert_eq!(ctx.lookup("b"), None);
        assert_eq!(ContextStack::default().lookup("a"), None);
    }

    #[test]
    fn test_dot_resolves_top() {
        let mut ctx = stack(vec![json!({"a": 1})]);
        ctx.push(Value::from("item"));
        assert_eq!(ctx.lookup("."), Some(Value::from("item")));
        assert_eq!(ctx.top(), Value::from("item"));
    }

    #[test]
    fn test_dot_is_current_null_frame() {
        let mut ctx = stack(vec![json!("base")]);
        ctx.push(Value::Null);
        assert_eq!(ctx.lookup("."), Some(Value::Null));
        ctx.pop();
        assert_eq!(ctx.lookup("."), Some(Value::from("base")));
        assert_eq!(ContextStack::default().lookup("."), None);
    }

    #[test]
    fn test_dotted_names() {
        let ctx = stack(vec![json!({"a": {"b": {"c": "deep"}}})]);
        assert_eq!(ctx.lookup("a.b.c"), Some(Value::from("deep")));
        assert_eq!(ctx.lookup("a.x.c"), None);
    }

    #[test]
    fn test_dotted_segments_do_not_see_outer_frames() {
        let mut ctx = stack(vec![json!({"a": {}, "b": "outer"})]);
        ctx.push(Value::from(json!({"c": 1})));
        assert_eq!(ctx.lookup("a.b"), None);
        assert_eq!(ctx.lookup("b"), Some(Value::from("outer")));
    }

    #[test]
    fn test_scalar_frames_are_skipped() {
        let mut ctx = stack(vec![json!({"name": "root"})]);
        ctx.push(Value::Integer(3));
        assert_eq!(ctx.lookup("name"), Some(Value::from("root")));
    }

    struct Account;

    impl Resolve for Account {
        fn call(&self, name: &str) -> Option<Value> {
            (name == "balance").then(|| Value::from("from method"))
        }

        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "balance" => Some(Value::from("from field")),
                "owner" => Some(Value::from("Ann")),
                _ => None,
            }
        }
    }

    #[test]
    fn test_method_wins_over_field() {
        let ctx = ContextStack::new([Value::object(Account)]);
        assert_eq!(ctx.lookup("balance"), Some(Value::from("from method")));
        assert_eq!(ctx.lookup("owner"), Some(Value::from("Ann")));
    }

    #[test]
    fn test_struct_miss_continues_to_next_frame() {
        let ctx = ContextStack::new([Value::object(Account), Value::from(json!({"id": 9}))]);
        assert_eq!(ctx.lookup("id"), Some(Value::Integer(9)));
    }
}
