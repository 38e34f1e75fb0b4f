//! Integration tests for the component render pipeline

use std::borrow::Cow;
use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use domweave::component::{Bindings, Child, Component, ComponentLogic, Definition, Props};
use domweave::dom::{DocumentHost, Event, MemoryDocument, NodeId};
use domweave::{RenderConfig, RenderError};

fn static_component(doc: &Rc<MemoryDocument>, template: &'static str) -> Component {
    Component::new(
        doc.clone(),
        Definition::new().template(template).build(|_, _| {}),
        Props::new(),
    )
}

fn chip(doc: &Rc<MemoryDocument>, name: &str) -> Component {
    Component::new(
        doc.clone(),
        Definition::new()
            .template("<li>[[name]]</li>")
            .build(|props, b| {
                b.bind_text("name", props.get_str("name").unwrap_or_default());
            }),
        Props::new().with("name", name),
    )
}

#[test]
fn test_constructed_root_is_empty_and_boxless() {
    let doc = Rc::new(MemoryDocument::new());
    let component = static_component(&doc, "<p>x</p>");
    assert_eq!(
        doc.outer_html(component.root()),
        r#"<div style="display: contents"></div>"#
    );
    assert!(component.bindings().is_empty());
}

#[test]
fn test_template_without_placeholders_renders_as_is() {
    let doc = Rc::new(MemoryDocument::new());
    let component = static_component(
        &doc,
        "\n    <section><h1>Title</h1><p>Body &amp; more</p></section>\n",
    );
    let root = component.render().expect("Should render");
    assert_eq!(
        doc.inner_html(root),
        "<section><h1>Title</h1><p>Body &amp; more</p></section>"
    );
}

#[test]
fn test_render_keeps_root_identity() {
    let doc = Rc::new(MemoryDocument::new());
    let component = static_component(&doc, "<p>x</p>");
    let first = component.render().unwrap();
    let second = component.render().unwrap();
    assert_eq!(first, second);
    assert_eq!(first, component.root());
    assert_eq!(doc.inner_html(first), "<p>x</p>");
}

#[test]
fn test_text_binding_is_substituted_verbatim() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<p>[[count]] items, [[ratio]] ratio</p>")
            .build(|_, b| {
                b.bind_text("count", 42).bind_text("ratio", 0.5);
            }),
        Props::new(),
    );
    let root = component.render().unwrap();
    assert_eq!(doc.inner_html(root), "<p>42 items, 0.5 ratio</p>");
}

#[test]
fn test_click_and_label_example() {
    let doc = Rc::new(MemoryDocument::new());
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::new(Cell::new(None::<NodeId>));

    let (counter, seen_root) = (calls.clone(), seen.clone());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<div [[click]]><span>[[label]]</span></div>")
            .build(move |_, b| {
                let (counter, seen_root) = (counter.clone(), seen_root.clone());
                b.bind_text("label", "Hi").bind_event("click", "click", move |c| {
                    counter.set(counter.get() + 1);
                    seen_root.set(Some(c.root()));
                });
            }),
        Props::new(),
    );

    let root = component.render().unwrap();
    assert_eq!(doc.inner_html(root), "<div><span>Hi</span></div>");

    let div = doc.find_element(root, "div").expect("Should have a div");
    assert_eq!(doc.listener_count(div, "click"), 1);
    assert_eq!(doc.attribute(div, "data-on"), None);

    let event = doc.dispatch_event(div, "click");
    assert_eq!(calls.get(), 1);
    assert_eq!(seen.get(), Some(component.root()));
    assert!(event.propagation_stopped());
    assert!(event.default_prevented());

    doc.dispatch_event(div, "click");
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_event_does_not_bubble_past_bound_element() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<button [[press]]>Go</button>")
            .build(|_, b| {
                b.bind_event("press", "click", |_| {});
            }),
        Props::new(),
    );
    let root = component.render().unwrap();

    let bubbled = Rc::new(Cell::new(false));
    let flag = bubbled.clone();
    doc.add_event_listener(root, "click", Rc::new(move |_: &mut Event| flag.set(true)));

    let button = doc.find_element(root, "button").unwrap();
    doc.dispatch_event(button, "click");
    assert!(!bubbled.get());
}

#[test]
fn test_multiple_events_on_one_element() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<button [[press]] [[hover]]>Go</button>")
            .build(|_, b| {
                b.bind_event("press", "click", |_| {})
                    .bind_event("hover", "mouseover", |_| {});
            }),
        Props::new(),
    );
    let root = component.render().unwrap();
    let button = doc.find_element(root, "button").unwrap();

    assert_eq!(doc.inner_html(root), "<button>Go</button>");
    assert_eq!(doc.listener_count(button, "click"), 1);
    assert_eq!(doc.listener_count(button, "mouseover"), 1);
}

#[test]
fn test_repeated_event_placeholder_fires_once() {
    let doc = Rc::new(MemoryDocument::new());
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<button [[press]] [[press]]>go</button>")
            .build(move |_, b| {
                let counter = counter.clone();
                b.bind_event("press", "click", move |_| counter.set(counter.get() + 1));
            }),
        Props::new(),
    );
    let root = component.render().unwrap();
    let button = doc.find_element(root, "button").unwrap();

    assert_eq!(doc.inner_html(root), "<button>go</button>");
    assert_eq!(doc.listener_count(button, "click"), 1);
    doc.dispatch_event(button, "click");
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_listeners_outlive_dropped_handle() {
    let doc = Rc::new(MemoryDocument::new());
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::new(Cell::new(None::<NodeId>));

    let root = {
        let (counter, seen_root) = (calls.clone(), seen.clone());
        let component = Component::new(
            doc.clone(),
            Definition::new()
                .template("<button [[press]]>go</button>")
                .build(move |_, b| {
                    let (counter, seen_root) = (counter.clone(), seen_root.clone());
                    b.bind_event("press", "click", move |c| {
                        counter.set(counter.get() + 1);
                        seen_root.set(Some(c.root()));
                    });
                }),
            Props::new(),
        );
        let root = component.render().unwrap();
        doc.append_child(doc.body(), root);
        root
    };

    let button = doc.find_element(root, "button").unwrap();
    let event = doc.dispatch_event(button, "click");
    assert_eq!(calls.get(), 1);
    assert_eq!(seen.get(), Some(root));
    assert!(event.default_prevented());
}

#[test]
fn test_rerender_discards_old_listeners() {
    let doc = Rc::new(MemoryDocument::new());
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<a [[go]]>go</a>")
            .build(move |_, b| {
                let counter = counter.clone();
                b.bind_event("go", "click", move |_| counter.set(counter.get() + 1));
            }),
        Props::new(),
    );

    let root = component.render().unwrap();
    let old_link = doc.find_element(root, "a").unwrap();
    component.render().unwrap();
    let new_link = doc.find_element(root, "a").unwrap();

    assert_ne!(old_link, new_link);
    assert_eq!(doc.parent(old_link), None);
    assert_eq!(doc.listener_count(new_link, "click"), 1);

    doc.dispatch_event(new_link, "click");
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_hidden_element_is_pruned() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<p [[vis]]>X</p><b>kept</b>")
            .build(|_, b| {
                b.bind_visibility("vis", false);
            }),
        Props::new(),
    );
    let root = component.render().unwrap();
    assert_eq!(doc.find_element(root, "p"), None);
    assert_eq!(doc.inner_html(root), "<b>kept</b>");
}

#[test]
fn test_visible_element_loses_marker() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template(r#"<p class="note" [[vis]]>X</p>"#)
            .build(|_, b| {
                b.bind_visibility("vis", true);
            }),
        Props::new(),
    );
    let root = component.render().unwrap();
    assert_eq!(doc.inner_html(root), r#"<p class="note">X</p>"#);
}

#[test]
fn test_visibility_follows_props() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<em [[badge]]>new</em><span>item</span>")
            .build(|props, b| {
                b.bind_visibility("badge", props.get_bool("fresh").unwrap_or(false));
            }),
        Props::new(),
    );

    let root = component.render().unwrap();
    assert_eq!(doc.inner_html(root), "<span>item</span>");

    component
        .update_props(Props::new().with("fresh", true))
        .unwrap();
    assert_eq!(doc.inner_html(root), "<em>new</em><span>item</span>");
}

#[test]
fn test_children_compose_in_order() {
    let doc = Rc::new(MemoryDocument::new());
    let chips = vec![chip(&doc, "A"), chip(&doc, "B")];
    let items = chips.clone();
    let list = Component::new(
        doc.clone(),
        Definition::new()
            .template("<ul>[[items]]</ul>")
            .build(move |_, b| {
                b.bind_children("items", items.iter());
            }),
        Props::new(),
    );

    let root = list.render().unwrap();
    let html = doc.inner_html(root);
    assert!(!html.contains("<!--"));
    insta::assert_snapshot!(html, @r#"<ul><div style="display: contents"><li>A</li></div><div style="display: contents"><li>B</li></div></ul>"#);

    let ul = doc.find_element(root, "ul").unwrap();
    assert_eq!(doc.children(ul), vec![chips[0].root(), chips[1].root()]);
}

#[test]
fn test_children_mixed_items() {
    let doc = Rc::new(MemoryDocument::new());
    let em = doc.create_element("em");
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<p>before [[items]] after</p>")
            .build(move |_, b| {
                b.bind_children(
                    "items",
                    vec![
                        Child::Text("t".to_string()),
                        Child::Node(em),
                        Child::Node(NodeId::new(9999)),
                    ],
                );
            }),
        Props::new(),
    );

    let root = component.render().unwrap();
    assert_eq!(doc.inner_html(root), "<p>before t<em></em> after</p>");
}

#[test]
fn test_empty_children_leave_no_marker() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<ul>[[items]]</ul>")
            .build(|_, b| {
                b.bind_children("items", Vec::<Child>::new());
            }),
        Props::new(),
    );
    let root = component.render().unwrap();
    assert_eq!(doc.inner_html(root), "<ul></ul>");
}

#[test]
fn test_nested_components_rerender_with_parent() {
    let doc = Rc::new(MemoryDocument::new());
    let builds = Rc::new(Cell::new(0));
    let counter = builds.clone();
    let child = Component::new(
        doc.clone(),
        Definition::new().template("<i>child</i>").build(move |_, _| {
            counter.set(counter.get() + 1);
        }),
        Props::new(),
    );
    let slot = child.clone();
    let parent = Component::new(
        doc.clone(),
        Definition::new()
            .template("<section>[[slot]]</section>")
            .build(move |_, b| {
                b.bind_children("slot", [slot.clone()]);
            }),
        Props::new(),
    );

    parent.render().unwrap();
    parent.render().unwrap();
    assert_eq!(builds.get(), 2);
    assert_eq!(doc.inner_html(child.root()), "<i>child</i>");
}

#[test]
fn test_unknown_placeholders_are_removed() {
    let doc = Rc::new(MemoryDocument::new());
    let component = static_component(&doc, r#"<p title="[[tip]]" [[flag]]>[[missing]]</p>"#);
    let root = component.render().unwrap();
    assert_eq!(doc.inner_html(root), r#"<p title=""></p>"#);
}

#[test]
fn test_update_props_merges_shallowly() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<p>[[greeting]], [[name]]</p>")
            .build(|props, b| {
                b.bind_text("greeting", props.get_str("greeting").unwrap_or("Hi"))
                    .bind_text("name", props.get_str("name").unwrap_or("nobody"));
            }),
        Props::new().with("greeting", "Hello").with("name", "Ada"),
    );

    let root = component.render().unwrap();
    assert_eq!(doc.inner_html(root), "<p>Hello, Ada</p>");

    let updated = component
        .update_props(Props::new().with("name", "Grace"))
        .unwrap();
    assert_eq!(updated, root);
    assert_eq!(doc.inner_html(root), "<p>Hello, Grace</p>");
    assert_eq!(component.props().get_str("greeting"), Some("Hello"));
}

#[test]
fn test_missing_template_is_reported() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(doc.clone(), Definition::new().build(|_, _| {}), Props::new());
    let err = component.render().unwrap_err();
    assert!(matches!(err, RenderError::Unimplemented { operation: "template" }));
}

#[test]
fn test_missing_build_is_reported() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(doc.clone(), Definition::new().template("<p></p>"), Props::new());
    let err = component.render().unwrap_err();
    assert!(matches!(err, RenderError::Unimplemented { operation: "build" }));
}

struct Bare;

impl ComponentLogic for Bare {}

#[test]
fn test_trait_defaults_are_unimplemented() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(doc.clone(), Bare, Props::new());
    assert!(matches!(
        component.render(),
        Err(RenderError::Unimplemented { operation: "template" })
    ));
}

struct Flaky {
    fail: Rc<Cell<bool>>,
}

impl ComponentLogic for Flaky {
    fn template(&self) -> Result<Cow<'_, str>, RenderError> {
        Ok(Cow::Borrowed("<p>[[n]]</p>"))
    }

    fn build(&self, props: &Props, bindings: &mut Bindings) -> Result<(), RenderError> {
        if self.fail.get() {
            return Err(RenderError::Unimplemented { operation: "build" });
        }
        bindings.bind_text("n", props.get_integer("n").unwrap_or(0));
        Ok(())
    }
}

#[test]
fn test_failed_render_keeps_previous_content() {
    let doc = Rc::new(MemoryDocument::new());
    let fail = Rc::new(Cell::new(false));
    let component = Component::new(
        doc.clone(),
        Flaky { fail: fail.clone() },
        Props::new().with("n", 1_i64),
    );

    let root = component.render().unwrap();
    assert_eq!(doc.inner_html(root), "<p>1</p>");

    fail.set(true);
    assert!(component.update_props(Props::new().with("n", 2_i64)).is_err());
    assert_eq!(doc.inner_html(root), "<p>1</p>");
    assert_eq!(component.props().get_integer("n"), Some(2));
}

#[test]
fn test_malformed_markup_is_reported() {
    let doc = Rc::new(MemoryDocument::new());
    let component = static_component(&doc, "<div><span></div>");
    match component.render() {
        Err(RenderError::Markup { markup, errors }) => {
            assert_eq!(markup, "<div><span></div>");
            assert!(!errors.is_empty());
        }
        other => panic!("Expected markup error, got {:?}", other),
    }
    assert_eq!(doc.inner_html(component.root()), "");
}

#[test]
fn test_custom_markers_and_root() {
    let doc = Rc::new(MemoryDocument::new());
    let config = RenderConfig::new()
        .with_visibility_attribute("x-if")
        .with_event_attribute("x-on")
        .with_component_comment_prefix("slot:")
        .with_root_tag("span")
        .with_root_style("");
    let component = Component::with_config(
        doc.clone(),
        Definition::new()
            .template("<p [[shown]] [[tap]]>[[items]]</p>")
            .build(|_, b| {
                b.bind_visibility("shown", true)
                    .bind_event("tap", "click", |_| {})
                    .bind_children("items", ["a"]);
            }),
        Props::new(),
        config,
    );

    let root = component.render().unwrap();
    assert_eq!(doc.outer_html(root), "<span><p>a</p></span>");
    let p = doc.find_element(root, "p").unwrap();
    assert_eq!(doc.listener_count(p, "click"), 1);
}

#[test]
fn test_escape_text_option() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::with_config(
        doc.clone(),
        Definition::new()
            .template("<p>[[raw]]</p>")
            .build(|_, b| {
                b.bind_text("raw", "<b>bold</b> & co");
            }),
        Props::new(),
        RenderConfig::new().with_escape_text(true),
    );
    let root = component.render().unwrap();
    assert_eq!(doc.find_element(root, "b"), None);
    assert_eq!(doc.text_content(root), "<b>bold</b> & co");
}

#[test]
fn test_raw_text_is_parsed_as_markup() {
    let doc = Rc::new(MemoryDocument::new());
    let component = Component::new(
        doc.clone(),
        Definition::new()
            .template("<p>[[raw]]</p>")
            .build(|_, b| {
                b.bind_text("raw", "<b>bold</b>");
            }),
        Props::new(),
    );
    let root = component.render().unwrap();
    assert!(doc.find_element(root, "b").is_some());
}

#[test]
fn test_data_driven_registration() {
    let table: toml::Table = toml::from_str(
        r#"
        title = "Report"
        archived = false
        tags = ["x", "y"]
        meta = { ignored = true }
        "#,
    )
    .unwrap();

    let html = domweave::render_template(
        "<h1>[[title]]</h1><p [[archived]]>old</p><ul>[[tags]]</ul>[[meta]]",
        &table,
    )
    .unwrap();
    assert_eq!(html, "<h1>Report</h1><ul>xy</ul>");
}
