use std::sync::Arc;

use traceable::{
    FrameDescriptor, Indent, NativeFormatter, NeedleResolver, NormalizedName, RawFrame, Trace,
    TraceOptions, ANONYMOUS_OBJECT,
};

fn options() -> TraceOptions {
    TraceOptions {
        needles: Arc::new(NeedleResolver::with_roots(["/srv/app"])),
        ..Default::default()
    }
}

#[test]
fn test_plain_round_trip() {
    let options = TraceOptions::configure(|o| {
        o.formatter = Arc::new(NativeFormatter);
        o.show_raw_function_name = true;
        o.show_column_number = true;
        o.show_full_path = true;
        o.indent = Indent::Text(String::new());
        o
    });
    let trace = Trace::from_stack_str(
        "Error: boom\n    at Type.method (path/to/file.ext:12:34)\n",
        options,
    );
    assert_eq!(trace.len(), 1);
    assert_eq!(trace.to_string(), "at Type.method (path/to/file.ext:12:34)");
}

#[test]
fn test_normalized_names() {
    let name = NormalizedName::new("Klass.fn [as renamed]", "");
    assert_eq!(name.name(), "renamed");

    let name = NormalizedName::new("handleRequest", "");
    assert_eq!(name.to_string(), "handleRequest");

    let trace = Trace::from_stack_str(
        "Error: boom
    at Klass.fn [as renamed] (/srv/app/k.js:1:1)
    at Object.<anonymous> (/srv/app/main.js:2:2)
    at Object.toString (/srv/app/main.js:3:3)
",
        options(),
    );
    let names: Vec<_> = trace.iter().map(|frame| frame.function_name()).collect();
    assert_eq!(names, ["Klass.renamed", "(anonymous function)", "Object.toString"]);
}

#[test]
fn test_generic_object_descriptor() {
    let trace = Trace::new(
        vec![RawFrame::call_site(FrameDescriptor {
            has_this: true,
            type_name: Some("Object".into()),
            function_name: Some("doStuff".into()),
            file_name: Some("/srv/app/stuff.js".into()),
            line_number: Some(4),
            column_number: Some(1),
            ..Default::default()
        })],
        options(),
    );
    assert_eq!(trace[0].function_name(), format!("{}.doStuff", ANONYMOUS_OBJECT));
}

#[cfg(unix)]
#[test]
fn test_package_needles_and_blackbox() {
    let path = "/srv/app/node_modules/pkg/lib/index.js";
    let resolver = NeedleResolver::with_roots(["/srv/app"]);
    assert_eq!(resolver.needles(path)[0], "pkg/lib/index.js");

    let stack = "Error: boom
    at run (/srv/app/node_modules/pkg/lib/index.js:1:1)
    at main (/srv/app/main.js:2:2)
";
    let trace = Trace::from_stack_str(stack, options());
    assert_eq!(trace.len(), 2);
    assert_eq!(trace[0].file_name(), Some("pkg/lib/index.js"));

    let mut blackboxed = options();
    blackboxed.blackbox = Some(vec!["pkg".into()]);
    let trace = Trace::from_stack_str(stack, blackboxed);
    assert_eq!(trace.len(), 1);
    assert_eq!(trace[0].function_name(), "main");
}

#[cfg(unix)]
#[test]
fn test_async_origin_survives_blackbox() {
    let frames = vec![
        RawFrame::text("    at main (/srv/app/main.js:2:2)"),
        RawFrame::text("    at tick (/srv/app/node_modules/pkg/loop.js:1:1)")
            .with_async_origin(vec![RawFrame::text("    at start (/srv/app/start.js:7:3)")]),
    ];
    let mut options = options();
    options.blackbox = Some(vec!["pkg".into()]);

    let trace = Trace::new(frames, options);
    assert_eq!(trace.len(), 1);
    let origin = trace[0].async_origin().expect("async origin was lost");
    assert_eq!(origin.len(), 1);
    assert_eq!(origin[0].function_name(), "start");
}

#[test]
fn test_native_descriptor() {
    let options = TraceOptions::configure(|o| {
        o.formatter = Arc::new(NativeFormatter);
        o.show_column_number = true;
        o
    });
    let trace = Trace::new(
        vec![RawFrame::call_site(FrameDescriptor {
            is_native: true,
            has_this: true,
            type_name: Some("Array".into()),
            function_name: Some("forEach".into()),
            file_name: Some("/srv/app/a.js".into()),
            line_number: Some(10),
            column_number: Some(2),
            ..Default::default()
        })],
        options,
    );
    assert_eq!(trace[0].source(), "native");
    assert_eq!(trace.to_string(), "    at Array.forEach (native)");
}

#[test]
fn test_descriptors_from_json() {
    let frames = FrameDescriptor::list_from_json(
        r#"[
            {"functionName": "fail", "fileName": "/srv/app/fail.js", "lineNumber": 3, "columnNumber": 9},
            {"isConstructor": true, "functionName": "Server", "fileName": "/srv/app/server.js",
             "lineNumber": 1, "columnNumber": 1,
             "asyncOrigin": [{"functionName": "start", "fileName": "/srv/app/start.js", "lineNumber": 7}]}
        ]"#,
    )
    .unwrap();
    let trace = Trace::new(frames, options());
    assert_eq!(trace[0].raw_string(), "fail (/srv/app/fail.js:3:9)");
    assert_eq!(trace[1].function_name(), "new Server");
    let origin = trace[1].async_origin().unwrap();
    assert_eq!(origin[0].line_number(), Some(7));
    assert_eq!(origin[0].column_number(), None);

    assert!(FrameDescriptor::list_from_json("{}").is_err());
}

#[test]
fn test_unparsed_lines_survive() {
    let trace = traceable::trace_str("Error: boom\n    at run (/srv/app/run.js:1:1)\n  weird line\n");
    assert_eq!(trace.len(), 2);
    assert!(trace[0].is_parsed());
    assert!(!trace[1].is_parsed());
    assert_eq!(trace[1].to_string(), "  weird line");
}

#[cfg(unix)]
#[test]
fn test_eval_frames() {
    let trace = Trace::from_stack_str(
        "Error: boom
    at eval (eval at compile (/srv/app/tpl.js:4:11), <anonymous>:1:7)
",
        options(),
    );
    let frame = &trace[0];
    assert_eq!(frame.file_name(), Some("<anonymous>"));
    assert_eq!(frame.eval_origin().unwrap().function_name(), "compile");
    assert_eq!(frame.source(), "<anonymous>:1 eval at tpl.js:4");
}
