use maud::{html, PreEscaped};
use pretty_assertions::assert_eq;
use serde_json::json;
use spider_safe_html::dom::{Element, Fragment, Node, NodeId};
use spider_safe_html::{keep_tags, remove_tags, Configuration, Mode, Policy, Sanitizer};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn document() -> String {
    html! {
        div class="wrap" {
            p onclick="steal()" { "Hello " a href="/home" target="_blank" { "home" } }
            ul {
                li { b { "bold" } }
                li { i title="t" { "italic" } }
            }
            img src="x.png" alt="x";
            script { (PreEscaped("alert(1)")) }
            form action="/post" { input type="text" name="q"; }
        }
    }
    .into_string()
}

fn elements(fragment: &Fragment) -> Vec<&Element> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = fragment.roots().to_vec();

    while let Some(id) = stack.pop() {
        if let Some(Node::Element(element)) = fragment.get(id) {
            found.push(element);
        }
        stack.extend_from_slice(fragment.children(id));
    }

    found
}

#[test]
fn keep_mode_containment() {
    init();
    let policy = json!({ "a": ["href"], "b": [], "i": [], "#text": [] });
    let output = keep_tags(&document(), Some(&policy), None);

    assert_eq!(
        output,
        "Hello <a href='/home'>home</a><b>bold</b><i>italic</i>"
    );

    let fragment = Fragment::parse(&output);

    for element in elements(&fragment) {
        assert!(["a", "b", "i"].contains(&element.name.as_str()));

        for (name, _) in &element.attrs {
            assert_eq!(element.name, "a");
            assert_eq!(name, "href");
        }
    }
}

#[test]
fn remove_mode_deny_completeness() {
    init();
    let policy = json!({ "a": ["target"], "i": [], "ul": ["*"] });
    let output = remove_tags(&document(), Some(&policy), None);
    let fragment = Fragment::parse(&output);
    let found = elements(&fragment);

    assert!(found.iter().all(|element| element.name != "i"));
    assert!(found
        .iter()
        .filter(|element| element.name == "a")
        .all(|element| element.attrs.iter().all(|(name, _)| name != "target")));
    assert!(found
        .iter()
        .filter(|element| element.name == "ul")
        .all(|element| element.attrs.is_empty()));
    assert!(output.contains("<p onclick='steal()'>"));
    assert!(output.contains("italic"));
}

#[test]
fn idempotent_under_the_same_policy() {
    init();
    let sanitizer = Sanitizer::default();
    let inputs = [
        document(),
        r#"<p>Hi <a href="/x?a=1&amp;b=2" title="t">l'ink</a> &lt;ok&gt;</p><br/><i></i>"#.into(),
        "<b><i>nested <u>deep</u></i></b>&amp; done".into(),
    ];

    for input in inputs.iter() {
        let once = sanitizer.sanitize(input);
        assert_eq!(sanitizer.sanitize(&once), once);
    }

    let tables = html! {
        table {
            caption { "c" }
            thead { tr { th { "h" } } }
            tr { td { b { "x" } " y" } td { "z" } }
        }
    }
    .into_string();
    let policies = [
        json!({ "td": [], "b": [], "#text": [] }),
        json!({ "tr": [], "td": [], "#text": [] }),
        json!({ "caption": [], "#text": [] }),
        json!({ "table": [], "td": [], "#text": [] }),
        json!({ "table": [], "tr": [], "b": [], "#text": [] }),
        json!({ "table": [], "caption": [], "th": [], "#text": [] }),
    ];

    for policy in policies.iter() {
        let (sanitizer, _) = Sanitizer::from_values(Mode::Keep, Some(policy), None);
        let once = sanitizer.sanitize(&tables);
        assert_eq!(sanitizer.sanitize(&once), once, "{policy}");
    }

    for policy in [json!({ "td": [] }), json!({ "tbody": [], "th": [] })].iter() {
        let (sanitizer, _) = Sanitizer::from_values(Mode::Remove, Some(policy), None);
        let once = sanitizer.sanitize(&tables);
        assert_eq!(sanitizer.sanitize(&once), once, "{policy}");
    }
}

#[test]
fn quote_is_never_left_raw() {
    init();
    let markup = html! { a href="/x" title="it's \"quoted\"" { "x" } }.into_string();

    assert_eq!(
        keep_tags(&markup, Some(&json!({ "a": ["href", "title"], "#text": [] })), None),
        r#"<a href='/x' title='it&#39;s "quoted"'>x</a>"#
    );
    assert_eq!(
        keep_tags(
            &markup,
            Some(&json!({ "a": ["href", "title"], "#text": [] })),
            Some(&json!({ "quotation": "\"" }))
        ),
        r#"<a href="/x" title="it's &#34;quoted&#34;">x</a>"#
    );
}

#[test]
fn reserved_tags_round_trip() {
    init();
    let output = remove_tags(
        r#"<!DOCTYPE html><html><head><title>t</title></head><body><img src="a.png"></body></html>"#,
        Some(&json!({ "code": [] })),
        None,
    );

    assert_eq!(
        output,
        "<!doctype html><html><head><title>t</title></head><body><img src='a.png'></body></html>"
    );
}

#[test]
fn options_from_json() {
    init();

    assert_eq!(
        keep_tags(
            "<b>x</b>",
            None,
            Some(&json!({ "tagName": "upper", "tag_open": "[", "TAG-CLOSE": "]" }))
        ),
        "[B]x[/B]"
    );
    assert_eq!(
        keep_tags("<b>\n\n  a   b \n</b>", None, Some(&json!({ "minify": true }))),
        "<b>a b</b>"
    );
    assert_eq!(
        keep_tags("<b>x</b>", None, Some(&json!({ "minify": "yes" }))),
        "<b>x</b>"
    );
}

#[test]
fn shared_across_threads() {
    init();
    let mut policy = Policy::new();
    policy
        .with_tag("b", Vec::<String>::new())
        .with_tag("#text", Vec::<String>::new());

    let sanitizer = Sanitizer::new(Mode::Keep, Some(&policy), Configuration::default());

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sanitizer = &sanitizer;
                scope.spawn(move || sanitizer.sanitize(&format!("<b>{i}</b><i>{i}</i>")))
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().ok(), Some(format!("<b>{i}</b>{i}")));
        }
    });
}
