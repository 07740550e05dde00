use tracing_subscriber::EnvFilter;

use crate::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

struct Fixture {
    vars: Variables,
    inputs: Inputs,
    x: VariableKey,
    y: VariableKey,
    level: VariableKey,
    z: VariableKey,
    w: VariableKey,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();

        let mut vars = Variables::new();
        let x = vars
            .add_input(
                "x",
                0. ..=1.,
                [
                    Term::constant("A", 0.6),
                    Term::constant("p2", 0.2),
                    Term::constant("p9", 0.9),
                    Term::constant("p5", 0.5),
                ],
            )
            .unwrap();
        let y = vars.add_input("y", 0. ..=1., [Term::constant("B", 0.4)]).unwrap();
        let level = vars
            .add_input(
                "level",
                0. ..=10.,
                [Term::points("low", &[(0., 1.), (10., 0.)]), Term::points("high", &[(0., 0.), (10., 1.)])],
            )
            .unwrap();
        let z = vars
            .add_output("z", 0. ..=1., [Term::triangle("C", 0., 0.5, 1.), Term::triangle("D", 0.5, 1., 1.)])
            .unwrap();
        let w = vars.add_output("w", 0. ..=1., [Term::triangle("E", 0., 0.5, 1.)]).unwrap();

        vars.get_mut(z).unwrap().set_aggregation(Some(SNorm::Maximum));

        let mut inputs = Inputs::new();

        inputs.add(x, 0.5);
        inputs.add(y, 0.5);
        inputs.add(level, 2.5);

        Self {
            vars,
            inputs,
            x,
            y,
            level,
            z,
            w,
        }
    }

    fn term(&self, var: VariableKey, name: &str) -> TermKey {
        self.vars[var].find_term(name).unwrap()
    }

    fn antecedent(&self, text: &str) -> Result<Antecedent> {
        let mut antecedent = Antecedent::new(text);

        antecedent.load(&self.vars)?;

        Ok(antecedent)
    }

    fn degree(&self, text: &str) -> Result<f64> {
        let mut outputs = Outputs::new(&self.vars);
        let cycle = Cycle::new(&self.vars, &self.inputs, &mut outputs);

        self.antecedent(text)?
            .activation_degree(Some(TNorm::Minimum), Some(SNorm::Maximum), &cycle)
    }

    fn block(&self, rules: &[&str]) -> RuleBlock {
        let mut block = RuleBlock::new("block");

        block.set_conjunction(Some(TNorm::Minimum));
        block.set_disjunction(Some(SNorm::Maximum));
        block.set_implication(Some(TNorm::Minimum));
        for rule in rules {
            block.add(rule, &self.vars).unwrap();
        }

        block
    }

    fn run(&self, block: &mut RuleBlock) -> Result<Outputs> {
        let mut outputs = Outputs::new(&self.vars);

        block.activate(&mut Cycle::new(&self.vars, &self.inputs, &mut outputs))?;

        Ok(outputs)
    }
}

fn syntax_message(result: Result<impl std::fmt::Debug>) -> String {
    match result {
        Err(FuzzyError::Syntax { message, .. }) => message,
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn test_product_conjunction_and_minimum_implication() {
    let f = Fixture::new();
    let mut block = f.block(&["if x is A and y is B then z is C"]);

    block.set_conjunction(Some(TNorm::AlgebraicProduct));

    let outputs = f.run(&mut block).unwrap();
    let activations = outputs.get(f.z).unwrap().terms();

    assert_close(block.rules()[0].activation_degree(), 0.24);
    assert!(block.rules()[0].is_triggered());
    assert_eq!(activations.len(), 1);
    assert_eq!(activations[0].term, f.term(f.z, "C"));
    assert_close(activations[0].degree, 0.24);
    assert_eq!(activations[0].implication, Some(TNorm::Minimum));
}

#[test]
fn test_hedges_wrap_from_the_term_outwards() {
    let f = Fixture::new();
    let x = 0.6;

    assert_close(f.degree("x is very A").unwrap(), x * x);
    assert_close(f.degree("x is not very A").unwrap(), 1. - x * x);
    assert_close(f.degree("x is very not A").unwrap(), (1. - x) * (1. - x));

    let chain = [Hedge::Somewhat, Hedge::Not, Hedge::Extremely, Hedge::Very];
    let expected = Hedge::Somewhat.apply(Hedge::Not.apply(Hedge::Extremely.apply(Hedge::Very.apply(x))));

    assert_close(f.degree("x is somewhat not extremely very A").unwrap(), expected);
    assert_close(fold_hedges(&chain, x), expected);
}

#[test]
fn test_min_max_connectives() {
    let f = Fixture::new();

    assert_close(f.degree("x is A and y is B").unwrap(), 0.4);
    assert_close(f.degree("x is A or y is B").unwrap(), 0.6);
    // Equal precedence, left to right
    assert_close(f.degree("x is p2 or x is A and y is B").unwrap(), 0.4);
    assert_close(f.degree("x is p2 or (x is A and y is B)").unwrap(), 0.4);
    assert_close(f.degree("x is p9 or (x is A and y is B)").unwrap(), 0.9);
    assert_close(f.degree("(x is p9 or x is A) and y is B").unwrap(), 0.4);
}

#[test]
fn test_input_value_drives_membership() {
    let f = Fixture::new();

    assert_close(f.degree("level is low").unwrap(), 0.75);
    assert_close(f.degree("level is high").unwrap(), 0.25);

    let mut inputs = f.inputs.clone();
    let mut outputs = Outputs::new(&f.vars);

    inputs.clear();

    let cycle = Cycle::new(&f.vars, &inputs, &mut outputs);
    let degree = f
        .antecedent("level is very low")
        .unwrap()
        .activation_degree(None, None, &cycle)
        .unwrap();

    assert!(degree.is_nan());
}

#[test]
fn test_disabled_variable_is_zero() {
    let mut f = Fixture::new();

    f.vars.get_mut(f.x).unwrap().set_enabled(false);

    assert_eq!(f.degree("x is A").unwrap(), 0.0);
    assert_eq!(f.degree("x is not A").unwrap(), 0.0);
    assert_eq!(f.degree("x is any").unwrap(), 0.0);
    assert_eq!(f.degree("x is not any").unwrap(), 0.0);
}

#[test]
fn test_any() {
    let f = Fixture::new();
    let any = f.antecedent("x is any").unwrap();

    match any.expression() {
        Some(Expr::Proposition(prop)) => {
            assert_eq!(prop.hedges, vec![Hedge::Any]);
            assert_eq!(prop.term, None);
        },
        other => panic!("unexpected expression {other:?}"),
    }

    assert_eq!(f.degree("x is any").unwrap(), 1.0);
    assert_eq!(f.degree("x is not any").unwrap(), 0.0);
    assert_eq!(f.degree("x is any and y is B").unwrap(), 0.4);

    // A term may not follow `any`
    let message = syntax_message(f.antecedent("x is any A"));
    assert!(message.contains("expected variable or logical operator"), "{message}");
}

#[test]
fn test_missing_operator_is_a_configuration_error() {
    let f = Fixture::new();
    let mut outputs = Outputs::new(&f.vars);
    let cycle = Cycle::new(&f.vars, &f.inputs, &mut outputs);

    let and = f.antecedent("x is A and y is B").unwrap();
    match and.activation_degree(None, Some(SNorm::Maximum), &cycle) {
        Err(FuzzyError::Configuration(message)) => {
            assert!(message.contains("conjunction"), "{message}");
            assert!(message.contains("x is A and y is B"), "{message}");
        },
        other => panic!("expected a configuration error, got {other:?}"),
    }

    let or = f.antecedent("x is A or y is B").unwrap();
    match or.activation_degree(Some(TNorm::Minimum), None, &cycle) {
        Err(FuzzyError::Configuration(message)) => {
            assert!(message.contains("disjunction"), "{message}");
            assert!(message.contains("x is A or y is B"), "{message}");
        },
        other => panic!("expected a configuration error, got {other:?}"),
    }

    // Propositions alone need no operator
    assert_eq!(f.antecedent("x is A").unwrap().activation_degree(None, None, &cycle), Ok(0.6));
}

#[test]
fn test_unloaded_antecedent_and_consequent() {
    let f = Fixture::new();
    let mut outputs = Outputs::new(&f.vars);
    let mut cycle = Cycle::new(&f.vars, &f.inputs, &mut outputs);

    assert!(matches!(
        Antecedent::new("x is A").activation_degree(None, None, &cycle),
        Err(FuzzyError::Invariant(_))
    ));
    assert!(matches!(
        Consequent::new("z is C").modify(1.0, None, &mut cycle),
        Err(FuzzyError::Invariant(_))
    ));
}

#[test]
fn test_leftover_expressions() {
    let f = Fixture::new();
    let message = syntax_message(f.antecedent("x is A y is B"));

    assert!(message.contains("unable to parse"), "{message}");
    assert!(message.contains("x is A"), "{message}");
    assert!(message.contains("y is B"), "{message}");
}

#[test]
fn test_antecedent_syntax_errors() {
    let f = Fixture::new();

    let cases = [
        ("", "antecedent is empty"),
        ("q is A", "expected variable or logical operator, but found <q>"),
        ("x A", "expected keyword <is>, but found <A>"),
        ("x is Z", "expected hedge or term, but found <Z>"),
        ("x is B", "expected hedge or term, but found <B>"),
        ("x is", "expected hedge or term after <is>"),
        ("x is very", "expected hedge or term after <very>"),
        ("x", "expected keyword <is> after <x>"),
        ("x is A and", "expects at least two operands, but found <1>"),
        // Rewritten to `x is A and` before scanning
        ("and x is A", "expects at least two operands, but found <1>"),
        ("(x is A", "mismatching parentheses"),
        ("x is A) or (y is B", "mismatching parentheses"),
    ];

    for (text, expected) in cases {
        let message = syntax_message(f.antecedent(text));
        assert!(message.contains(expected), "<{text}>: {message}");
    }

    match f.antecedent("x is Z") {
        Err(FuzzyError::Syntax { token, .. }) => assert_eq!(token.as_deref(), Some("Z")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_failed_load_leaves_antecedent_unloaded() {
    let f = Fixture::new();
    let mut antecedent = f.antecedent("x is A").unwrap();

    assert!(antecedent.is_loaded());

    // Reloading against a registry without `x` fails and drops the old tree
    assert!(antecedent.load(&Variables::new()).is_err());
    assert!(!antecedent.is_loaded());
    assert_eq!(antecedent.text(), "x is A");

    antecedent.load(&f.vars).unwrap();
    assert!(antecedent.is_loaded());
}

#[test]
fn test_infix_round_trip() {
    let f = Fixture::new();

    for text in [
        "x is A and y is B",
        "x is A or y is very B and level is not low",
        "x is A or (y is B and (level is somewhat high or x is any))",
    ] {
        let original = f.antecedent(text).unwrap();
        let infix = original.display(&f.vars, Notation::Infix).unwrap().to_string();
        let reparsed = f.antecedent(&infix).unwrap();

        assert_eq!(reparsed.expression(), original.expression(), "{text} -> {infix}");
    }

    let simple = f.antecedent("x is A and y is B").unwrap();
    let expected = Expr::from(Proposition::new(f.x, f.term(f.x, "A"))).and(Proposition::new(f.y, f.term(f.y, "B")).into());

    assert_eq!(simple.expression(), Some(&expected));
    assert_eq!(
        simple.display(&f.vars, Notation::Infix).unwrap().to_string(),
        "(x is A and y is B)"
    );
    assert_eq!(
        simple.display(&f.vars, Notation::Postfix).unwrap().to_string(),
        "x is A y is B and"
    );
}

#[test]
fn test_consequent_parsing() {
    let f = Fixture::new();
    let mut consequent = Consequent::new("z is very C and w is E");

    consequent.load(&f.vars).unwrap();

    let conclusions = consequent.conclusions();

    assert_eq!(conclusions.len(), 2);
    assert_eq!(conclusions[0].variable, f.z);
    assert_eq!(conclusions[0].hedges, vec![Hedge::Very]);
    assert_eq!(conclusions[0].term, Some(f.term(f.z, "C")));
    assert_eq!(conclusions[1].variable, f.w);
    assert_eq!(consequent.display(&f.vars).to_string(), "z is very C and w is E");
}

#[test]
fn test_consequent_syntax_errors() {
    let f = Fixture::new();

    let cases = [
        ("", "consequent is empty"),
        ("x is A", "expected output variable, but found <x>"),
        ("z C", "expected keyword <is>, but found <C>"),
        ("z is E", "expected hedge or term, but found <E>"),
        ("z is C or w is E", "expected operator <and>, but found <or>"),
        ("z is C and", "expected output variable after <and>"),
        ("z is C and w", "expected keyword <is> after <w>"),
        ("z is C and w is not", "expected hedge or term after <not>"),
    ];

    for (text, expected) in cases {
        let mut consequent = Consequent::new(text);
        let message = syntax_message(consequent.load(&f.vars));

        assert!(message.contains(expected), "<{text}>: {message}");
        // The first conclusion parsed fine, but nothing partial is kept
        assert!(consequent.conclusions().is_empty(), "<{text}>");
        assert!(!consequent.is_loaded());
    }
}

#[test]
fn test_modify_applies_hedges_and_skips_disabled_outputs() {
    let mut f = Fixture::new();
    let mut consequent = Consequent::new("z is not C and w is E");

    consequent.load(&f.vars).unwrap();
    f.vars.get_mut(f.w).unwrap().set_enabled(false);

    let mut outputs = Outputs::new(&f.vars);

    consequent
        .modify(0.25, Some(TNorm::AlgebraicProduct), &mut Cycle::new(&f.vars, &f.inputs, &mut outputs))
        .unwrap();

    assert_eq!(
        outputs.get(f.z).unwrap().terms(),
        &[Activated::new(f.term(f.z, "C"), 0.75, Some(TNorm::AlgebraicProduct))]
    );
    assert!(outputs.get(f.w).unwrap().is_empty());
}

#[test]
fn test_rule_parts() {
    let f = Fixture::new();
    let rule = Rule::parse("if x is A then z is C and w is E with 0.5", &f.vars).unwrap();

    assert_eq!(rule.weight(), 0.5);
    assert_eq!(rule.antecedent().text(), "x is A");
    assert_eq!(rule.consequent().text(), "z is C and w is E");
    assert!(rule.is_loaded());
    assert_eq!(
        rule.display(&f.vars).to_string(),
        "if x is A then z is C and w is E with 0.5"
    );

    let cases = [
        ("x is A then z is C", "expected keyword <if>"),
        ("if x is A", "keyword <then> not found"),
        ("if then z is C", "antecedent not found"),
        ("if x is A then", "consequent not found"),
        ("if x is A then z is C with", "expected a numeric weight"),
        ("if x is A then z is C with heavy", "expected a numeric weight, but found <heavy>"),
        ("if x is A then z is C with 0.5 now", "unexpected token <now>"),
    ];

    for (text, expected) in cases {
        let message = syntax_message(Rule::parse(text, &f.vars));
        assert!(message.contains(expected), "<{text}>: {message}");
    }
}

#[test]
fn test_weight_scales_degree() {
    let f = Fixture::new();
    let mut block = f.block(&["if x is A then z is C with 0.5"]);
    let outputs = f.run(&mut block).unwrap();

    assert_close(block.rules()[0].activation_degree(), 0.3);
    assert_close(outputs.get(f.z).unwrap().terms()[0].degree, 0.3);
}

#[test]
fn test_rule_load_is_all_or_nothing() {
    let mut f = Fixture::new();
    let mut rule = Rule::unloaded("if x is A then tip is high").unwrap();

    assert!(!rule.is_loaded());
    assert!(rule.load(&f.vars).is_err());
    assert!(!rule.antecedent().is_loaded());
    assert!(!rule.consequent().is_loaded());

    let mut outputs = Outputs::new(&f.vars);
    let cycle = Cycle::new(&f.vars, &f.inputs, &mut outputs);

    assert!(matches!(rule.activate_with(None, None, &cycle), Err(FuzzyError::Invariant(_))));

    f.vars.add_output("tip", 0. ..=30., [Term::triangle("high", 15., 30., 30.)]).unwrap();

    let mut block = RuleBlock::new("late");

    block.add_rule(rule);
    block.load_rules(&f.vars).unwrap();
    assert!(block.rules()[0].is_loaded());

    block.unload_rules();
    assert!(!block.rules()[0].is_loaded());
}

#[test]
fn test_disabled_rule_and_block_do_not_fire() {
    let f = Fixture::new();
    let mut block = f.block(&["if x is A then z is C", "if y is B then w is E"]);

    block.rule_mut(0).unwrap().set_enabled(false);

    let outputs = f.run(&mut block).unwrap();

    assert_close(block.rules()[0].activation_degree(), 0.6);
    assert!(!block.rules()[0].is_triggered());
    assert!(outputs.get(f.z).unwrap().is_empty());
    assert!(block.rules()[1].is_triggered());

    block.set_enabled(false);

    let outputs = f.run(&mut block).unwrap();

    assert!(outputs.get(f.w).unwrap().is_empty());
}

fn ranked_block(f: &Fixture, activation: Activation) -> RuleBlock {
    let mut block = f.block(&[
        "if x is p2 then z is C",
        "if x is p9 then z is D",
        "if x is p5 then w is E",
    ]);

    block.set_activation(activation);
    block
}

fn triggered(block: &RuleBlock) -> Vec<bool> {
    block.rules().iter().map(Rule::is_triggered).collect()
}

#[test]
fn test_last_fires_from_the_end() {
    let f = Fixture::new();
    let mut block = ranked_block(&f, Activation::Last(Last { rules: 1, threshold: 0.0 }));
    let outputs = f.run(&mut block).unwrap();

    assert_eq!(triggered(&block), vec![false, false, true]);
    // Rules past the quota are still evaluated
    let degrees: Vec<f64> = block.rules().iter().map(Rule::activation_degree).collect();
    assert_eq!(degrees, vec![0.2, 0.9, 0.5]);
    assert!(outputs.get(f.z).unwrap().is_empty());
    assert_eq!(outputs.get(f.w).unwrap().terms().len(), 1);

    block.set_activation(Activation::Last(Last { rules: 2, threshold: 0.6 }));
    f.run(&mut block).unwrap();
    assert_eq!(triggered(&block), vec![false, true, false]);

    block.set_activation(Activation::Last(Last { rules: 5, threshold: 0.0 }));
    f.run(&mut block).unwrap();
    assert_eq!(triggered(&block), vec![true, true, true]);
}

#[test]
fn test_other_activation_methods() {
    let f = Fixture::new();

    let mut first = ranked_block(&f, Activation::First(First { rules: 1, threshold: 0.0 }));
    f.run(&mut first).unwrap();
    assert_eq!(triggered(&first), vec![true, false, false]);

    let mut first = ranked_block(&f, Activation::First(First { rules: 1, threshold: 0.3 }));
    f.run(&mut first).unwrap();
    assert_eq!(triggered(&first), vec![false, true, false]);

    let mut general = ranked_block(&f, Activation::default());
    f.run(&mut general).unwrap();
    assert_eq!(triggered(&general), vec![true, true, true]);

    let threshold = Activation::from_name("Threshold", ">= 0.5").unwrap();
    let mut thresholded = ranked_block(&f, threshold);
    f.run(&mut thresholded).unwrap();
    assert_eq!(triggered(&thresholded), vec![false, true, true]);

    let mut below = ranked_block(&f, Activation::from_name("Threshold", "< 0.5").unwrap());
    f.run(&mut below).unwrap();
    assert_eq!(triggered(&below), vec![true, false, false]);
}

#[test]
fn test_activation_configuration() {
    let mut last = Activation::from_name("Last", "3 0.25").unwrap();

    assert_eq!(last.name(), "Last");
    assert_eq!(last.parameters(), "3 0.25");
    assert_eq!(last, Activation::Last(Last { rules: 3, threshold: 0.25 }));
    assert_eq!(last.to_string(), "Last 3 0.25");

    let round_trip = Activation::from_name(last.name(), &last.parameters()).unwrap();
    assert_eq!(round_trip, last);

    last.configure("").unwrap();
    assert_eq!(last.parameters(), "3 0.25");

    assert!(matches!(last.configure("3"), Err(FuzzyError::Configuration(_))));
    assert!(matches!(last.configure("three 0.5"), Err(FuzzyError::Configuration(_))));
    assert!(matches!(Activation::from_name("Highest", ""), Err(FuzzyError::Configuration(_))));
    assert!(matches!(Activation::from_name("Threshold", "~ 0.5"), Err(FuzzyError::Configuration(_))));

    let general = Activation::from_name("General", "").unwrap();
    assert_eq!(general.to_string(), "General");
    assert_eq!(Activation::from_name("First", "").unwrap(), Activation::First(First::default()));
}

#[test]
fn test_output_feedback_depends_on_order() {
    let f = Fixture::new();
    let rules = ["if x is A then z is C", "if z is C then w is E"];

    let mut forward = f.block(&rules);
    let outputs = f.run(&mut forward).unwrap();

    assert_close(forward.rules()[1].activation_degree(), 0.6);
    assert_close(outputs.get(f.w).unwrap().terms()[0].degree, 0.6);

    let mut backward = f.block(&rules);
    backward.set_activation(Activation::Last(Last { rules: 2, threshold: 0.0 }));
    let outputs = f.run(&mut backward).unwrap();

    // The feedback rule ran before anything was accumulated on z
    assert_eq!(backward.rules()[1].activation_degree(), 0.0);
    assert!(outputs.get(f.w).unwrap().is_empty());
    assert_eq!(outputs.get(f.z).unwrap().terms().len(), 1);
}

#[test]
fn test_operator_errors_propagate_from_activation() {
    let f = Fixture::new();
    let mut block = f.block(&["if x is A and y is B then z is C"]);

    block.set_conjunction_named("").unwrap();

    assert!(matches!(f.run(&mut block), Err(FuzzyError::Configuration(_))));

    block.set_conjunction_named("HamacherProduct").unwrap();
    assert_eq!(block.conjunction(), Some(TNorm::HamacherProduct));
    assert!(block.set_disjunction_named("Minimum").is_err());
    block.set_disjunction_named("AlgebraicSum").unwrap();
    block.set_implication_named("AlgebraicProduct").unwrap();
    assert_eq!(block.implication(), Some(TNorm::AlgebraicProduct));
    assert!(f.run(&mut block).is_ok());
}

#[test]
fn test_cloned_blocks_are_independent() {
    let f = Fixture::new();
    let block = f.block(&["if x is A or y is B then z is C"]);
    let mut copy = block.clone();

    f.run(&mut copy).unwrap();

    assert!(copy.rules()[0].is_triggered());
    assert!(!block.rules()[0].is_triggered());
    assert_eq!(block.rules()[0].activation_degree(), 0.0);
    assert_eq!(copy.rules()[0].antecedent(), block.rules()[0].antecedent());
}

#[test]
fn test_output_read_back_after_firing() {
    let f = Fixture::new();
    let mut block = f.block(&["if level is high then z is D"]);
    let outputs = f.run(&mut block).unwrap();

    assert_eq!(outputs.activation_degree(f.z, f.term(f.z, "D")), 0.25);
    assert_eq!(f.inputs.value(f.level), 2.5);
}
