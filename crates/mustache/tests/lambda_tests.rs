//! Lambdas in variable tags and sections

use mustache::{render, Lambda, MustacheError, Value};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn context(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

#[test]
fn test_interpolation() {
    let data = context(vec![("lambda", Lambda::from_fn(|| "world".to_string()).into())]);
    assert_eq!(render("Hello, {{lambda}}!", [data]).unwrap(), "Hello, world!");
}

#[test]
fn test_interpolation_expansion() {
    let data = context(vec![
        ("planet", Value::from("world")),
        ("lambda", Lambda::from_fn(|| "{{planet}}".to_string()).into()),
    ]);
    assert_eq!(render("Hello, {{lambda}}!", [data]).unwrap(), "Hello, world!");
}

#[test]
fn test_interpolation_uses_default_delimiters() {
    let data = context(vec![
        ("planet", Value::from("world")),
        (
            "lambda",
            Lambda::from_fn(|| "|planet| => {{planet}}".to_string()).into(),
        ),
    ]);
    let output = render("{{= | | =}}\nHello, (|&lambda|)!", [data]).unwrap();
    assert_eq!(output, "Hello, (|planet| => world)!");
}

#[test]
fn test_interpolation_multiple_calls() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let data = context(vec![(
        "lambda",
        Lambda::from_fn(move || (counter.fetch_add(1, Ordering::SeqCst) + 1).to_string()).into(),
    )]);
    let output = render("{{lambda}} == {{{lambda}}} == {{lambda}}", [data]).unwrap();
    assert_eq!(output, "1 == 2 == 3");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_interpolation_is_escaped() {
    let data = context(vec![("lambda", Lambda::from_fn(|| ">".to_string()).into())]);
    assert_eq!(render("<{{lambda}}{{{lambda}}}", [data]).unwrap(), "<&gt;>");
}

#[test]
fn test_section_receives_raw_body() {
    let lambda = Lambda::new(|text, _render| {
        Ok(if text == "{{x}}" { "yes" } else { "no" }.to_string())
    });
    let data = context(vec![("x", Value::from("Error!")), ("lambda", lambda.into())]);
    assert_eq!(render("<{{#lambda}}{{x}}{{/lambda}}>", [data]).unwrap(), "<yes>");
}

#[test]
fn test_section_expansion() {
    let lambda = Lambda::new(|text, render| {
        render(&[text, "{{planet}}", text].concat())
    });
    let data = context(vec![("planet", Value::from("Earth")), ("lambda", lambda.into())]);
    assert_eq!(render("<{{#lambda}}-{{/lambda}}>", [data]).unwrap(), "<-Earth->");
}

#[test]
fn test_section_result_is_rendered() {
    let data = context(vec![
        ("x", Value::from("1")),
        ("lambda", Lambda::from_fn(|| "{{x}}".to_string()).into()),
    ]);
    assert_eq!(render("<{{#lambda}}ignored{{/lambda}}>", [data]).unwrap(), "<1>");
}

#[test]
fn test_section_result_uses_section_delimiters() {
    let data = context(vec![
        ("x", Value::from("1")),
        ("lambda", Lambda::from_fn(|| "{{x}} |x|".to_string()).into()),
    ]);
    let output = render("{{= | | =}}<|#lambda||/lambda|>", [data]).unwrap();
    assert_eq!(output, "<{{x}} 1>");
}

#[test]
fn test_section_uses_section_delimiters() {
    let lambda = Lambda::new(|text, render| {
        render(&[text, "{{planet}} => |planet|", text].concat())
    });
    let data = context(vec![("planet", Value::from("Earth")), ("lambda", lambda.into())]);
    let output = render("{{= | | =}}<|#lambda|-|/lambda|>", [data]).unwrap();
    assert_eq!(output, "<-{{planet}} => Earth->");
}

#[test]
fn test_section_multiple_calls() {
    let lambda = Lambda::new(|text, render| render(&format!("__{text}__")));
    let data = context(vec![("lambda", lambda.into())]);
    let output = render(
        "{{#lambda}}FILE{{/lambda}} != {{#lambda}}LINE{{/lambda}}",
        [data],
    )
    .unwrap();
    assert_eq!(output, "__FILE__ != __LINE__");
}

#[test]
fn test_inverted_section_treats_lambda_as_truthy() {
    let data = context(vec![
        ("static", Value::from("static")),
        ("lambda", Lambda::from_fn(String::new).into()),
    ]);
    assert_eq!(render("<{{^lambda}}{{static}}{{/lambda}}>", [data]).unwrap(), "<>");
}

#[test]
fn test_section_render_sees_current_frame() {
    let wrap = Lambda::new(|text, render| Ok(format!("<b>{}</b>", render(text)?)));
    let data = context(vec![
        ("wrap", wrap.into()),
        (
            "items",
            Value::from(serde_json::json!([{"name": "a"}, {"name": "b"}])),
        ),
    ]);
    let output = render("{{#items}}{{#wrap}}{{name}}{{/wrap}}{{/items}}", [data]).unwrap();
    assert_eq!(output, "<b>a</b><b>b</b>");
}

#[test]
fn test_lambda_error_aborts_render() {
    let lambda = Lambda::new(|_, _| Err(MustacheError::lambda("boom")));
    let data = context(vec![("lambda", lambda.into())]);
    let err = render("before {{#lambda}}x{{/lambda}}", [data]).unwrap_err();
    assert!(matches!(err, MustacheError::Lambda { ref message } if message == "boom"));
    assert_eq!(err.to_string(), "lambda error: boom");
}
