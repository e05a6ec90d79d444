//! End-to-end behavior of `Root` over `MemoryTarget`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tola_reconcile::prelude::*;

type Node = VNode<NodeId>;
type Log = Rc<RefCell<Vec<String>>>;

fn mount() -> Root<MemoryTarget> {
    let mut target = MemoryTarget::new();
    let body = target.create_root("body");
    Root::new(target, body)
}

fn html(root: &Root<MemoryTarget>) -> String {
    root.with_target(|t| t.to_html(root.container()))
}

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

fn record(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_rerender_with_equal_tree_touches_nothing() {
    let root = mount();
    let view = || -> Node {
        div(
            nodes![span(nodes!["a"], Attrs::new().style("width", 1)), "b"],
            Attrs::new().style("color", "red"),
        )
    };

    root.render(view()).unwrap();
    let mutations = root.with_target(|t| t.mutations());
    let applied = root.stats().actions_applied;

    root.render(view()).unwrap();
    assert_eq!(root.with_target(|t| t.mutations()), mutations);
    assert_eq!(root.stats().actions_applied, applied);
    assert_eq!(root.stats().reconciliations, 1);
}

fn list(items: &[&str]) -> Node {
    ul(items.iter().map(|item| li(nodes![*item], Attrs::new())), Attrs::new())
}

#[test]
fn test_list_updates_keep_element_identity() {
    let root = mount();

    root.render(list(&["a", "b", "c"])).unwrap();
    let first_li = root.with_target(|t| t.find(root.container(), "li")).unwrap();

    root.render(list(&["a", "c", "d"])).unwrap();
    assert_eq!(html(&root), "<body><ul><li>a</li><li>c</li><li>d</li></ul></body>");

    root.render(list(&["a"])).unwrap();
    assert_eq!(html(&root), "<body><ul><li>a</li></ul></body>");
    assert_eq!(root.with_target(|t| t.find(root.container(), "li")), Some(first_li));
}

#[test]
fn test_mixed_children_delete_and_insert() {
    let root = mount();
    root.render(div(nodes!["lead", span(nodes!["x"], Attrs::new())], Attrs::new()))
        .unwrap();
    let span_id = root.with_target(|t| t.find(root.container(), "span")).unwrap();

    root.render(div(nodes![span(nodes!["x"], Attrs::new()), "tail"], Attrs::new()))
        .unwrap();
    assert_eq!(html(&root), "<body><div><span>x</span>tail</div></body>");
    assert_eq!(root.with_target(|t| t.find(root.container(), "span")), Some(span_id));
}

#[test]
fn test_fragment_children_insert_at_container_offset() {
    let root = mount();
    let view = |middle: Vec<Node>| -> Node {
        div(nodes!["x", fragment(middle), "y"], Attrs::new())
    };

    root.render(view(nodes!["a", "b"])).unwrap();
    assert_eq!(html(&root), "<body><div>xaby</div></body>");

    root.render(view(nodes!["a", span(nodes!["c"], Attrs::new()), "b"])).unwrap();
    assert_eq!(html(&root), "<body><div>xa<span>c</span>by</div></body>");

    root.render(view(nodes![])).unwrap();
    assert_eq!(html(&root), "<body><div>xy</div></body>");
}

#[test]
fn test_style_changes_reach_the_target() {
    let root = mount();
    root.render(div(nodes![], Attrs::new().style("width", 300).style("color", "blue")))
        .unwrap();
    root.render(div(nodes![], Attrs::new().style("width", 200).style("height", 10)))
        .unwrap();

    let div = root.with_target(|t| t.find(root.container(), "div")).unwrap();
    root.with_target(|t| {
        assert_eq!(t.style(div, "width"), Some(&StyleValue::Number(200.0)));
        assert_eq!(t.style(div, "height"), Some(&StyleValue::Number(10.0)));
        assert_eq!(t.style(div, "color"), None);
    });
}

// =============================================================================
// Hooks
// =============================================================================

fn tracked(cx: &mut RenderCx<'_>, input: &(u32, Log)) -> Node {
    let (x, log) = (input.0, &input.1);

    let l = Rc::clone(log);
    cx.use_effect(move || record(&l, format!("always {x}")));

    let l = Rc::clone(log);
    cx.use_effect_with(x, move || {
        record(&l, format!("run {x}"));
        move || record(&l, format!("cleanup {x}"))
    });

    let l = Rc::clone(log);
    cx.use_effect_with((), move || record(&l, "once"));

    text(x.to_string())
}

#[test]
fn test_effect_dependencies() {
    let root = mount();
    let log = new_log();

    root.render(component_with(tracked, (1, Rc::clone(&log)))).unwrap();
    assert_eq!(entries(&log), ["always 1", "run 1", "once"]);

    log.borrow_mut().clear();
    root.render(component_with(tracked, (1, Rc::clone(&log)))).unwrap();
    assert_eq!(entries(&log), ["always 1"]);

    log.borrow_mut().clear();
    root.render(component_with(tracked, (2, Rc::clone(&log)))).unwrap();
    assert_eq!(entries(&log), ["cleanup 1", "always 2", "run 2"]);
    assert_eq!(html(&root), "<body>2</body>");
}

#[test]
fn test_unmount_runs_disposers() {
    let root = mount();
    let log = new_log();

    root.render(div(vec![component_with(tracked, (7, Rc::clone(&log)))], Attrs::new()))
        .unwrap();
    log.borrow_mut().clear();

    root.render(div(vec![], Attrs::new())).unwrap();
    assert_eq!(entries(&log), ["cleanup 7"]);
    assert_eq!(html(&root), "<body><div></div></body>");
}

fn leaf(cx: &mut RenderCx<'_>, log: &Log) -> Node {
    let l = Rc::clone(log);
    cx.use_effect(move || record(&l, "child"));
    text("leaf")
}

fn branch(cx: &mut RenderCx<'_>, log: &Log) -> Node {
    let l = Rc::clone(log);
    cx.use_effect(move || record(&l, "parent"));
    div(vec![component_with(leaf, Rc::clone(log))], Attrs::new())
}

#[test]
fn test_child_effects_run_before_parent() {
    let root = mount();
    let log = new_log();

    root.render(component_with(branch, Rc::clone(&log))).unwrap();
    assert_eq!(entries(&log), ["child", "parent"]);

    root.render(component_with(branch, Rc::clone(&log))).unwrap();
    assert_eq!(entries(&log), ["child", "parent", "child", "parent"]);
}

fn first(cx: &mut RenderCx<'_>, log: &Log) -> Node {
    let l = Rc::clone(log);
    cx.use_effect_with((), move || {
        record(&l, "first mount");
        move || record(&l, "first cleanup")
    });
    text("first")
}

fn second(cx: &mut RenderCx<'_>, log: &Log) -> Node {
    let l = Rc::clone(log);
    cx.use_effect_with((), move || record(&l, "second mount"));
    text("second")
}

#[test]
fn test_replacing_a_component_runs_its_disposers() {
    let root = mount();
    let log = new_log();

    root.render(div(vec![component_with(first, Rc::clone(&log))], Attrs::new()))
        .unwrap();
    root.render(div(vec![component_with(second, Rc::clone(&log))], Attrs::new()))
        .unwrap();

    assert_eq!(entries(&log), ["first mount", "first cleanup", "second mount"]);
    assert_eq!(html(&root), "<body><div>second</div></body>");
}

fn loader(cx: &mut RenderCx<'_>) -> Node {
    let (value, set_value) = cx.use_state(0);
    cx.use_effect_with((), move || {
        let _ = set_value.set(10);
    });
    text(value.to_string())
}

#[test]
fn test_setter_inside_effect_rerenders() {
    let root = mount();
    root.render(component(loader)).unwrap();
    assert_eq!(html(&root), "<body>10</body>");
    assert_eq!(root.stats().component_updates, 1);
}

fn chained(cx: &mut RenderCx<'_>, log: &Log) -> Node {
    let (n, set_n) = cx.use_state(0);
    let l = Rc::clone(log);
    cx.use_effect(move || {
        record(&l, format!("run {n}"));
        if n < 2 {
            let _ = set_n.set(n + 1);
        }
        move || record(&l, format!("cleanup {n}"))
    });
    text(n.to_string())
}

#[test]
fn test_each_effect_run_is_cleaned_up_once() {
    let root = mount();
    let log = new_log();

    root.render(div(vec![component_with(chained, Rc::clone(&log))], Attrs::new()))
        .unwrap();
    assert_eq!(html(&root), "<body><div>2</div></body>");
    assert_eq!(entries(&log), ["run 0", "cleanup 0", "run 1", "cleanup 1", "run 2"]);

    root.render(div(vec![], Attrs::new())).unwrap();
    assert_eq!(
        entries(&log),
        ["run 0", "cleanup 0", "run 1", "cleanup 1", "run 2", "cleanup 2"]
    );
}

fn eager(cx: &mut RenderCx<'_>, log: &Log) -> Node {
    let (n, set_n) = cx.use_state(0);
    if n < 2 {
        set_n.set(n + 1).unwrap();
    }
    let l = Rc::clone(log);
    cx.use_effect(move || {
        record(&l, format!("run {n}"));
        move || record(&l, format!("cleanup {n}"))
    });
    text(n.to_string())
}

#[test]
fn test_effects_of_superseded_renders_never_run() {
    let root = mount();
    let log = new_log();

    root.render(div(vec![component_with(eager, Rc::clone(&log))], Attrs::new()))
        .unwrap();
    assert_eq!(html(&root), "<body><div>2</div></body>");
    assert_eq!(entries(&log), ["run 2"]);

    root.render(div(vec![], Attrs::new())).unwrap();
    assert_eq!(entries(&log), ["run 2", "cleanup 2"]);
}

#[test]
fn test_equal_value_setter_is_a_noop() {
    let root = mount();
    let setter: Rc<RefCell<Option<SetState<&'static str>>>> = Rc::new(RefCell::new(None));
    let stash = Rc::clone(&setter);
    root.render(component(move |cx: &mut RenderCx<'_>| -> Node {
        let (label, set_label) = cx.use_state("same");
        *stash.borrow_mut() = Some(set_label);
        text(label)
    }))
    .unwrap();

    let set_label = setter.borrow().clone().unwrap();
    set_label.set("same").unwrap();
    assert_eq!(root.stats().component_updates, 0);

    set_label.update(|_| "changed").unwrap();
    assert_eq!(root.stats().component_updates, 1);
    assert_eq!(html(&root), "<body>changed</body>");
}

fn doubled(cx: &mut RenderCx<'_>, input: &(u32, Rc<Cell<u32>>)) -> Node {
    let (x, calls) = (input.0, Rc::clone(&input.1));
    let value = cx.use_memo(x, move || {
        calls.set(calls.get() + 1);
        x * 2
    });
    text(value.to_string())
}

#[test]
fn test_memo_recomputes_only_on_dependency_change() {
    let root = mount();
    let calls = Rc::new(Cell::new(0));

    root.render(component_with(doubled, (2, Rc::clone(&calls)))).unwrap();
    root.render(component_with(doubled, (2, Rc::clone(&calls)))).unwrap();
    assert_eq!(calls.get(), 1);

    root.render(component_with(doubled, (3, Rc::clone(&calls)))).unwrap();
    assert_eq!(calls.get(), 2);
    assert_eq!(html(&root), "<body>6</body>");
}

#[test]
fn test_ref_survives_rerenders_without_triggering() {
    let root = mount();
    let view = || -> Node {
        component(|cx: &mut RenderCx<'_>| -> Node {
            let renders = cx.use_ref(|| 0u32);
            *renders.borrow_mut() += 1;
            text(renders.get().to_string())
        })
    };

    root.render(view()).unwrap();
    root.render(view()).unwrap();
    root.render(view()).unwrap();
    assert_eq!(html(&root), "<body>3</body>");
    assert_eq!(root.stats().component_updates, 0);
}

// =============================================================================
// Events and signals
// =============================================================================

fn todo_list(cx: &mut RenderCx<'_>) -> Node {
    let (items, set_items) = cx.use_state(Vec::<String>::new());
    let add = {
        let items = items.clone();
        move || {
            let mut next = items.clone();
            next.push(format!("item {}", next.len()));
            set_items.set(next)
        }
    };
    div(
        vec![
            button(nodes!["add"], Attrs::new().on("click", add)),
            ul(items.iter().map(|i| li(nodes![i.as_str()], Attrs::new())), Attrs::new()),
        ],
        Attrs::new(),
    )
}

#[test]
fn test_clicks_grow_a_list() {
    let root = mount();
    root.render(component(todo_list)).unwrap();

    for _ in 0..3 {
        let button = root.with_target(|t| t.find(root.container(), "button")).unwrap();
        assert!(root.dispatch(&button, "click").unwrap());
    }

    let items = root.with_target(|t| t.find_all(root.container(), "li").len());
    assert_eq!(items, 3);
    assert!(html(&root).contains("<li>item 2</li>"));
}

#[test]
fn test_watch_guard_unsubscribes_on_drop() {
    let signal = Signal::new(1);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let guard = signal.watch(move |new: &i32, old: &i32| sink.borrow_mut().push((*new, *old)));

    signal.set(2).unwrap();
    drop(guard);
    signal.set(3).unwrap();

    assert_eq!(*seen.borrow(), vec![(2, 1)]);
    assert_eq!(signal.observer_count(), 0);
}

#[test]
fn test_signal_shared_by_two_components() {
    let root = mount();
    let count = Signal::new(0);

    let reader = |label: &'static str, count: &Signal<i32>| -> Node {
        let count = count.clone();
        setup_component(move || {
            let count = count.clone();
            move |cx: &mut RenderCx<'_>| -> Node { text(format!("{label}{}", count.get(cx))) }
        })
    };
    root.render(div(vec![reader("a", &count), reader("b", &count)], Attrs::new()))
        .unwrap();

    count.set(5).unwrap();
    assert_eq!(html(&root), "<body><div>a5b5</div></body>");
}

// =============================================================================
// Scheduling
// =============================================================================

#[test]
fn test_scheduled_render_runs_on_host_tick() {
    let root = mount();
    let host = TickQueue::new();
    let scheduler = Scheduler::new(host.clone(), SchedulerConfig::with_budget(Duration::ZERO));

    scheduler.enqueue(|| ());
    scheduler.enqueue(|| ());
    scheduler.flush();

    root.schedule_render(&scheduler, text("later"));
    assert!(!root.is_mounted());

    host.run_until_idle();
    assert!(root.is_mounted());
    assert_eq!(html(&root), "<body>later</body>");
}
