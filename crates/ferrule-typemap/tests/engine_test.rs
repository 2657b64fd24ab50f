//! End-to-end tests for the typemap engine: registration, lookup, wrapper
//! emission and scope behavior working together.

use ferrule_ctype::TypeSystem;
use ferrule_typemap::{Param, Typemaps};
use ferrule_wrap::Wrapper;

/// Register + lookup of a plain single-parameter rule: `$1` expands to the
/// wrapper local, everything else is left for later passes.
#[test]
fn test_single_argument_register_and_lookup() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();

    let parms = vec![Param::named("int", "x")];
    tm.register("in", &parms, "$1 = PyInt_AsLong($input);", &[], &[]);

    let code = tm
        .lookup("in", "int", Some("x"), "arg1", "obj0", "result", None, &ts)
        .expect("rule should match");
    assert_eq!(code, "arg1 = PyInt_AsLong($input);");
}

/// A rule registered on `int[ANY]` fires for `int[10]`, and `$dim0` picks up
/// the queried extent.
#[test]
fn test_array_wildcard_and_dimension_expansion() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();

    let parms = vec![Param::new("a(ANY).int")];
    tm.register(
        "in",
        &parms,
        "memcpy($1, $input, sizeof(int)*$dim0);",
        &[],
        &[],
    );

    let entry = tm
        .search("in", "a(10).int", None, &ts)
        .expect("wildcard rule should match");
    assert!(entry.has_code());

    let code = tm
        .lookup("in", "a(10).int", None, "arg1", "obj0", "result", None, &ts)
        .unwrap();
    assert_eq!(code, "memcpy(arg1, $input, sizeof(int)*10);");
}

/// A two-parameter rule is stored on the last parameter's node under the
/// signature-suffixed key, and multi-argument search consumes both.
#[test]
fn test_multi_argument_storage_and_search() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();

    let parms = vec![
        Param::named("int", "argc"),
        Param::named("p.p.char", "argv"),
    ];
    tm.register("in", &parms, "$1 = len; $2 = vec;", &[], &[]);

    let node = tm.node(0, "p.p.char", Some("argv")).unwrap();
    assert!(node.contains_key("tmap:in-int+argc:"));

    let (entry, nmatch) = tm.search_multi("in", &parms, &ts).unwrap();
    assert_eq!(nmatch, 2);
    assert_eq!(entry.code.as_deref(), Some("$1 = len; $2 = vec;"));
}

/// `%apply`-style copy: the destination gets an identical rule under its own
/// signature.
#[test]
fn test_apply_copies_rule_to_new_signature() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();

    let src = vec![Param::named("p.int", "OUTPUT")];
    tm.register("in", &src, "*$1 = 0;", &[], &[]);

    let dst = vec![Param::named("p.double", "result")];
    tm.copy("in", &src, &dst).unwrap();

    let entry = tm.search("in", "p.double", Some("result"), &ts).unwrap();
    assert_eq!(entry.code.as_deref(), Some("*$1 = 0;"));
}

/// Rules in an inner scope shadow the global ones and disappear with the
/// scope.
#[test]
fn test_scope_shadowing_and_pop() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();

    let parms = vec![Param::named("int", "x")];
    tm.register("in", &parms, "outer;", &[], &[]);

    tm.push_scope().unwrap();
    tm.register("in", &parms, "inner;", &[], &[]);
    let e = tm.search("in", "int", Some("x"), &ts).unwrap();
    assert_eq!(e.code.as_deref(), Some("inner;"));

    let popped = tm.pop_scope().expect("inner scope should pop");
    assert!(!popped.is_empty());
    assert!(popped.node("int", Some("x")).is_some());

    let e = tm.search("in", "int", Some("x"), &ts).unwrap();
    assert_eq!(e.code.as_deref(), Some("outer;"));

    // rules living only in the popped scope are gone for good
    tm.push_scope().unwrap();
    tm.pop_scope();
    let e = tm.search("in", "int", Some("x"), &ts).unwrap();
    assert_eq!(e.code.as_deref(), Some("outer;"));
}

/// Expanding `$descriptor` emits the mangled descriptor name and notifies
/// the type registry exactly once.
#[test]
fn test_descriptor_expansion_remembers_type() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();

    let parms = vec![Param::new("p.Foo")];
    tm.register(
        "out",
        &parms,
        "$target = SWIG_NewPointerObj($1, $descriptor);",
        &[],
        &[],
    );

    let code = tm
        .lookup("out", "p.Foo", None, "result", "result", "resultobj", None, &ts)
        .unwrap();
    assert_eq!(
        code,
        "resultobj = SWIG_NewPointerObj(result, SWIGTYPE_p_Foo);"
    );
    assert_eq!(ts.remembered(), vec!["p.Foo"]);
}

/// Lookup declares rule locals through the wrapper and patches the code to
/// the allocated names.
#[test]
fn test_lookup_declares_locals_in_wrapper() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();
    let mut w = Wrapper::new();

    let parms = vec![Param::named("p.char", "s")];
    let locals = vec![Param::named("$ltype", "temp")];
    tm.register("in", &parms, "temp = ($ltype) $input; $1 = temp;", &locals, &[]);

    let code = tm
        .lookup(
            "in",
            "p.char",
            Some("s"),
            "arg1",
            "obj0",
            "result",
            Some(&mut w),
            &ts,
        )
        .unwrap();

    assert!(w.has_local("temp"));
    assert_eq!(w.local_decl("temp"), Some("char *temp"));
    assert_eq!(code, "temp = (char *) $input; arg1 = temp;");
}

/// Attach walks a parameter list: a two-parameter group and a single rule,
/// with kwargs, group links, `$argnum`, and wrapper locals suffixed by the
/// argument position.
#[test]
fn test_attach_parameter_list() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();
    let mut w = Wrapper::new();

    let pair = vec![
        Param::named("int", "argc"),
        Param::named("p.p.char", "argv"),
    ];
    let kwargs = vec![Param::named("", "numinputs").with_value("1")];
    tm.register("in", &pair, "$1 = (int)len($input); $2 = vec($input);", &[], &kwargs);

    let single = vec![Param::named("double", "weight")];
    let locals = vec![Param::named("$ltype", "dtemp")];
    tm.register(
        "in",
        &single,
        "dtemp = ($ltype) as_double($input); $1 = dtemp;",
        &locals,
        &[],
    );

    let mut parms = vec![
        Param::named("int", "argc").with_lname("arg1"),
        Param::named("p.p.char", "argv").with_lname("arg2"),
        Param::named("double", "weight").with_lname("arg3"),
    ];
    tm.attach("in", &mut parms, Some(&mut w), &ts);

    // the group's first parameter carries the rendered code and the kwarg
    assert_eq!(
        parms[0].attached_text("tmap:in"),
        Some("arg1 = (int)len($input); arg2 = vec($input);")
    );
    assert_eq!(parms[0].attached_text("tmap:in:numinputs"), Some("1"));
    // the group link skips over the consumed second parameter
    assert_eq!(parms[0].attached_link("tmap:in:next"), Some(Some(2)));
    assert!(parms[1].attrs.is_empty());

    // the third parameter matched on its own; its local got the position
    // suffix and $argnum its position
    assert_eq!(
        parms[2].attached_text("tmap:in"),
        Some("dtemp3 = (double) as_double($input); arg3 = dtemp3;")
    );
    assert_eq!(parms[2].attached_link("tmap:in:next"), Some(None));
    assert!(w.has_local("dtemp3"));
    assert_eq!(w.local_decl("dtemp3"), Some("double dtemp3"));
}

/// `$argnum` expands to the 1-based position of the first parameter the
/// rule consumed.
#[test]
fn test_attach_argnum() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();

    let single = vec![Param::named("double", "weight")];
    tm.register("in", &single, "check($input, $argnum);", &[], &[]);

    let mut parms = vec![
        Param::named("int", "x").with_lname("arg1"),
        Param::named("double", "weight").with_lname("arg2"),
    ];
    tm.attach("in", &mut parms, None, &ts);

    // no rule for the first parameter: skipped, no attributes
    assert!(parms[0].attrs.is_empty());
    assert_eq!(
        parms[1].attached_text("tmap:in"),
        Some("check($input, 2);")
    );
}

/// register / clear / search round trip: clearing strips the rule to a
/// codeless shell.
#[test]
fn test_clear_round_trip() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();

    let parms = vec![Param::named("int", "x")];
    tm.register("in", &parms, "code;", &[], &[]);
    tm.clear("in", &parms);

    let entry = tm.search("in", "int", Some("x"), &ts).unwrap();
    assert!(!entry.has_code());
    assert!(tm
        .lookup("in", "int", Some("x"), "arg1", "o", "r", None, &ts)
        .is_none());
}

/// After `init` the engine is back to a single empty scope.
#[test]
fn test_init_resets_engine() {
    let mut tm = Typemaps::new();
    let ts = TypeSystem::new();

    tm.push_scope().unwrap();
    tm.register("in", &[Param::named("int", "x")], "code;", &[], &[]);
    tm.init();

    assert_eq!(tm.scope_depth(), 1);
    assert!(tm.search("in", "int", Some("x"), &ts).is_none());
}

/// The `%except` handler shares the scope stack.
#[test]
fn test_except_scoping() {
    let mut tm = Typemaps::new();
    tm.except_register("catch_all();");
    tm.push_scope().unwrap();

    assert_eq!(tm.except_lookup(), Some("catch_all();".to_string()));
    tm.except_register("catch_class();");
    assert_eq!(tm.except_lookup(), Some("catch_class();".to_string()));

    tm.pop_scope();
    assert_eq!(tm.except_lookup(), Some("catch_all();".to_string()));
    tm.except_clear();
    assert_eq!(tm.except_lookup(), None);
}

/// The debug dump lists scopes top-down with every registered key.
#[test]
fn test_debug_dump() {
    let mut tm = Typemaps::new();
    tm.register("in", &[Param::named("int", "x")], "code;", &[], &[]);
    tm.push_scope().unwrap();
    tm.register("out", &[Param::new("p.Foo")], "out;", &[], &[]);

    let mut out = Vec::new();
    tm.dump(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let scope1 = text.find("::: scope 1").unwrap();
    let scope0 = text.find("::: scope 0").unwrap();
    assert!(scope1 < scope0, "top scope should print first");
    assert!(text.contains("tmap:in"));
    assert!(text.contains("tmap:out"));
    assert!(text.contains("(int, x)"));
}
