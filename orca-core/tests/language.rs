#[cfg(test)]
mod tests {
    use orca_core::parser::ast::{Expression, Statement};
    use orca_core::parser::{parse_expression, parse_statements_with, OrcaError};
    use orca_core::{CommandSet, Interpreter, InterpreterConfig, Value};
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> Result<Option<Value>, OrcaError> {
        let program = parse_statements_with(source, &CommandSet::empty())?;
        Interpreter::new().run_program(&program)
    }

    fn show(source: &str) -> String {
        match run(source) {
            Ok(Some(value)) => value.to_string(),
            Ok(None) => "none".to_string(),
            Err(e) => panic!("{} failed: {}", source, e),
        }
    }

    #[test]
    fn test_push_then_pop_restores_list() {
        assert_eq!(show("l = [1, 2]\nv = l.pop()\nl.push(v)\n[v, l]"), "[2, [1, 2]]");
        assert_eq!(show("l = ['a']\nl.push('b')\n[l.pop(), l]"), "['b', ['a']]");
    }

    #[test]
    fn test_insert_then_remove_restores_list() {
        assert_eq!(
            show("l = [1, 2, 3]\nl.insert(1, 'x')\nv = l.remove(1)\n[v, l]"),
            "['x', [1, 2, 3]]"
        );
        assert_eq!(show("l = []\nl.insert(0, 1)\nl"), "[1]");
        assert_eq!(show("l = [1]\nl.insert(1, 2)\nl"), "[1, 2]");
    }

    #[test]
    fn test_string_members() {
        assert_eq!(show("s = 'abc'\ns.push('d')\ns"), "abcd");
        assert_eq!(show("s = 'abc'\n[s.pop(), s]"), "['c', 'ab']");
        assert_eq!(show("s = 'ac'\ns.insert(1, 'b')\ns"), "abc");
        assert_eq!(show("s = 'abc'\n[s.remove(0), s]"), "['a', 'bc']");
        assert_eq!(show("'abc'.contains('bc')"), "true");
        assert_eq!(show("[1, 'a'].contains('a')"), "true");
        assert_eq!(show("'  padded  '.trim"), "padded");
    }

    #[test]
    fn test_member_errors() {
        assert_eq!(run("[].pop()"), Ok(Some(Value::None)));
        assert!(matches!(run("[1].remove(1)"), Err(OrcaError::Index(_))));
        assert!(matches!(run("[1].insert(2, 0)"), Err(OrcaError::Index(_))));
        assert!(matches!(run("[1].push()"), Err(OrcaError::Arity { .. })));
        assert!(matches!(run("'ab'.push('cd')"), Err(OrcaError::Type(_))));
        assert!(matches!(run("[1].trim"), Err(OrcaError::UnknownMethod { .. })));
    }

    #[test]
    fn test_template_interpolation() {
        assert_eq!(show("name = 'John'\n\"$name Doe\""), "John Doe");
        assert_eq!(
            run("\"$missing\""),
            Err(OrcaError::UndefinedVariable("missing".to_string()))
        );
    }

    #[test]
    fn test_range_sequences() {
        assert_eq!(show("out = []\nfor i in 0..3 { out.push(i) }\nout"), "[0, 1, 2]");
        assert_eq!(show("out = []\nfor i in 3..0 { out.push(i) }\nout"), "[3, 2, 1]");
        assert_eq!(show("out = []\nfor i in 0..1..0.25 { out.push(i) }\nout"), "[0, 0.25, 0.5, 0.75]");
        assert!(matches!(run("1..5..-1"), Err(OrcaError::InvalidRange(_))));
    }

    #[test]
    fn test_functions() {
        let add = "func add(x, y) { return x + y }\n";
        assert_eq!(show(&format!("{}add(1, 2)", add)), "3");
        assert!(matches!(
            run(&format!("{}add(1)", add)),
            Err(OrcaError::Arity { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_list_equality_and_aliasing() {
        assert_eq!(show("a = [1, [2]]\nb = [1, [2]]\na == b"), "true");
        assert_eq!(show("a = [1]\nb = [1]\nb.push(2)\na == b"), "false");
        assert_eq!(show("a = [1, 2]\nb = a\nb.push(3)\na.len"), "3");
    }

    #[test]
    fn test_self_containing_list_displays() {
        assert_eq!(show("a = [1]\na.push(a)\na"), "[1, [...]]");
    }

    #[test]
    fn test_parse_errors_carry_position() {
        let err = run("x = 1\ny = (1 +").unwrap_err();
        assert!(matches!(err, OrcaError::Parse { .. }));
        assert_eq!(err.span().map(|span| span.line), Some(2));

        let err = run("x = 1.").unwrap_err();
        assert!(matches!(err, OrcaError::Lex { .. }));
    }

    #[test]
    fn test_rendered_error_points_at_source() {
        #[cfg(feature = "colored")]
        colored::control::set_override(false);
        let source = "x = )";
        let err = run(source).unwrap_err();
        let rendered = err.render(source);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1 | x = )");
        assert_eq!(lines[2], "        ^");
    }

    #[test]
    fn test_runtime_errors_render_as_message() {
        let err = run("1 - 'a'").unwrap_err();
        assert_eq!(err.render("1 - 'a'"), err.to_string());
    }

    #[test]
    fn test_program_structure() {
        let program = parse_statements_with(
            "func f(a) {\n    return a\n}\nx = f(1)\n",
            &CommandSet::empty(),
        )
        .unwrap();
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(&program.statements[0], Statement::FunctionDef { name, params, .. }
            if name == "f" && params == &vec!["a".to_string()]));
        assert!(matches!(&program.statements[1], Statement::Assign { name, value: Expression::Call { .. } }
            if name == "x"));
    }

    #[test]
    fn test_expression_display() {
        assert_eq!(parse_expression("1 + 2 * 3").unwrap().to_string(), "(1 + (2 * 3))");
        assert_eq!(parse_expression("xs[0].len").unwrap().to_string(), "xs[0].len()");
    }

    #[test]
    fn test_script_arguments() {
        let config = InterpreterConfig::default().with_argv(vec!["in.txt".to_string()]);
        let mut interpreter = Interpreter::with_config(config);
        let program = parse_statements_with("\"reading ${argv}\"", &CommandSet::empty()).unwrap();
        let value = interpreter.run_program(&program).unwrap();
        assert_eq!(value, Some(Value::from("reading ['in.txt']")));
    }
}
