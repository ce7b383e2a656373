//! End-to-end injection over a sled store

use codeweave::context::{RequestContext, ResourceType};
use codeweave::pipeline::{InjectionPipeline, LifecyclePoint};
use codeweave::sandbox::{SandboxConfig, ScriptSandbox};
use codeweave::store::SledFragmentStore;
use codeweave::types::FragmentKind;
use std::sync::Arc;
use tempfile::TempDir;

fn setup(rules: &str) -> (TempDir, Arc<SledFragmentStore>, InjectionPipeline) {
    let store_dir = TempDir::new().unwrap();
    let store = Arc::new(SledFragmentStore::new(store_dir.path()).unwrap());
    store.set_rules(rules).unwrap();
    let pipeline = InjectionPipeline::new(
        store.clone(),
        ScriptSandbox::new(SandboxConfig::default()),
    );
    (store_dir, store, pipeline)
}

fn about_page() -> RequestContext {
    RequestContext::builder()
        .singular(true)
        .resource_id(7)
        .slug("about")
        .title("About Us")
        .resource_type(ResourceType::Page)
        .build()
}

#[test]
fn test_head_and_footer_for_matching_request() {
    let (_dir, store, pipeline) = setup("about");
    store.set_global(FragmentKind::Style, "h1{margin:0}").unwrap();
    store.set_global(FragmentKind::ClientScript, "track();").unwrap();
    store
        .set_global(FragmentKind::ServerScript, "echo(\"<p>global</p>\");")
        .unwrap();
    store
        .set_resource(7, "echo(\"<p>\" + ctx.slug + \"</p>\");")
        .unwrap();

    let ctx = about_page();
    assert_eq!(pipeline.head(&ctx), "<style>h1{margin:0}</style>");
    assert_eq!(
        pipeline.footer(&ctx),
        "<script>track();</script><p>global</p><p>about</p>"
    );
}

#[test]
fn test_global_fragments_skipped_when_rules_do_not_match() {
    let (_dir, store, pipeline) = setup("contact, category-news");
    store.set_global(FragmentKind::Style, "h1{margin:0}").unwrap();
    store.set_global(FragmentKind::ClientScript, "track();").unwrap();
    store.set_resource(7, "echo(\"[page]\");").unwrap();

    let ctx = about_page();
    assert_eq!(pipeline.head(&ctx), "");
    assert_eq!(pipeline.footer(&ctx), "[page]");
}

#[test]
fn test_nothing_injected_on_admin_requests() {
    let (_dir, store, pipeline) = setup("all");
    store.set_global(FragmentKind::Style, "h1{margin:0}").unwrap();
    store.set_global(FragmentKind::ClientScript, "track();").unwrap();

    let admin = RequestContext::builder().admin(true).build();
    assert_eq!(pipeline.head(&admin), "");
    assert_eq!(pipeline.footer(&admin), "");
}

#[test]
fn test_failing_global_script_does_not_block_resource_script() {
    let (_dir, store, pipeline) = setup("all");
    store
        .set_global(FragmentKind::ServerScript, "throw \"broken\";")
        .unwrap();
    store.set_resource(7, "echo(\"[page]\");").unwrap();

    let rendered = pipeline.render(LifecyclePoint::Footer, &about_page());
    assert_eq!(
        rendered.markup,
        "<!-- Global script error: broken -->[page]"
    );
    assert_eq!(rendered.errors.len(), 1);
    assert_eq!(rendered.errors[0].message, "broken");
}

#[test]
fn test_failing_resource_script_is_contained() {
    let (_dir, store, pipeline) = setup("");
    store.set_resource(7, "let x = ;").unwrap();

    let rendered = pipeline.render(LifecyclePoint::Footer, &about_page());
    assert!(rendered
        .markup
        .starts_with("<!-- Resource script error: "));
    assert!(rendered.markup.ends_with(" -->"));
    assert_eq!(rendered.errors.len(), 1);
}

#[test]
fn test_markup_in_stored_style_is_stripped() {
    let (_dir, store, pipeline) = setup("all");
    store
        .set_global(FragmentKind::Style, "</style><script>x()</script>p{}")
        .unwrap();

    assert_eq!(pipeline.head(&about_page()), "<style>p{}</style>");
}

#[test]
fn test_rule_changes_apply_to_next_render() {
    let (_dir, store, pipeline) = setup("");
    store.set_global(FragmentKind::ClientScript, "track();").unwrap();

    let ctx = about_page();
    assert_eq!(pipeline.footer(&ctx), "");

    store.set_rules("post-7").unwrap();
    assert_eq!(pipeline.footer(&ctx), "<script>track();</script>");
}
