use protomut::{primitives as p, Fuzz, Mutant, RenderOptions, Session};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn static_field_never_mutates() -> anyhow::Result<()> {
    init_logging();

    let mut field = p::fixed("HTTP/1.1");
    assert!(!field.is_fuzzable());
    assert_eq!(field.num_mutations(), 0);
    assert!(!field.advance());
    assert_eq!(field.render(), b"HTTP/1.1");
    assert_eq!(field.mutations(0)?.count(), 0);
    Ok(())
}

#[test]
fn non_fuzzable_field_ignores_its_library() -> anyhow::Result<()> {
    let mut field = Mutant::new("a", ["b", "c"]).fuzzable(false);
    assert_eq!(field.num_mutations(), 0);
    assert!(!field.advance());
    assert_eq!(field.value(), b"a");
    assert!(field.goto(1).unwrap_err().is_out_of_range());
    Ok(())
}

#[test]
fn group_enumerates_values_in_order_and_keeps_duplicates() -> anyhow::Result<()> {
    let mut field = p::group(b"\x01", [b"\x02", b"\x03", b"\x02"]);
    assert_eq!(field.num_mutations(), 3);

    let mut seen = vec![];
    while field.advance() {
        seen.push((field.mutant_index(), field.render()));
    }
    assert_eq!(
        seen,
        [
            (1, b"\x02".to_vec()),
            (2, b"\x03".to_vec()),
            (3, b"\x02".to_vec()),
        ]
    );

    // Exhaustion restores the original value.
    assert_eq!(field.mutant_index(), 0);
    assert_eq!(field.render(), b"\x01");
    Ok(())
}

#[test]
fn exhausted_field_restarts_on_next_enumeration() -> anyhow::Result<()> {
    let mut field = p::group("x", ["y"]);
    assert!(field.advance());
    assert!(field.is_exhausted());
    assert!(!field.advance());
    assert!(!field.is_exhausted());
    assert!(field.advance());
    assert_eq!(field.value(), b"y");
    Ok(())
}

#[test]
fn goto_matches_replay() -> anyhow::Result<()> {
    let values = ["b", "c", "d", "e"];
    let mut seeked = p::group("a", values);
    let mut replayed = p::group("a", values);

    for index in 0..=values.len() {
        seeked.goto(index)?;
        replayed.reset();
        for _ in 0..index {
            replayed.advance();
        }
        assert_eq!(seeked.render(), replayed.render());
        assert_eq!(seeked.mutant_index(), index);
    }
    Ok(())
}

#[test]
fn goto_past_the_end_is_out_of_range() -> anyhow::Result<()> {
    let mut field = p::group("a", ["b", "c"]);
    field.goto(2)?;
    let err = field.goto(3).unwrap_err();
    assert!(err.is_out_of_range());
    assert_eq!(err.to_string(), "tried to go to mutation 3 > num_mutations (2)");
    Ok(())
}

#[test]
fn render_options_override_current_value() -> anyhow::Result<()> {
    let mut field = p::group("guest", ["admin"]).named("user")?;
    field.advance();

    assert_eq!(field.render(), b"admin");
    assert_eq!(field.render_original(), b"guest");
    assert_eq!(
        field.render_with(&RenderOptions::new().replace("user", b"root")),
        b"root"
    );
    // Replacements only apply to the named element.
    assert_eq!(
        field.render_with(&RenderOptions::new().replace("other", b"root")),
        b"admin"
    );
    Ok(())
}

#[test]
fn invalid_names_are_rejected() -> anyhow::Result<()> {
    for name in ["", "with space", "dotted.name", "dash-name"] {
        let err = p::fixed("x").named(name).unwrap_err();
        assert!(err.is_invalid_name(), "{name:?} should be invalid");
    }
    assert!(p::fixed("x").named("Field_01").is_ok());
    Ok(())
}

#[test]
fn sequence_peek_and_reset() -> anyhow::Result<()> {
    let mut field = p::group("GET", ["PUT", "POST"]);
    let mut seq = field.mutations(0)?;
    assert_eq!(seq.size_hint(), (2, Some(2)));
    assert_eq!(seq.peek(), b"GET");

    assert_eq!(seq.next().as_deref(), Some(&b"PUT"[..]));
    assert_eq!(seq.peek(), b"PUT");
    assert_eq!(seq.mutant_index(), 1);

    seq.reset();
    assert_eq!(seq.peek(), b"GET");
    assert_eq!(seq.collect::<Vec<_>>(), [&b"PUT"[..], b"POST"]);
    Ok(())
}

#[test]
fn sequence_from_a_start_index() -> anyhow::Result<()> {
    let values = ["1", "2", "3", "4", "5"];
    let mut field = p::group("0", values);

    for k in 0..values.len() {
        let from_k = field.mutations(k)?.next();
        let nth = field.mutations(0)?.nth(k);
        assert_eq!(from_k, nth);
    }
    assert!(field.mutations(values.len())?.next().is_none());
    assert!(field.mutations(values.len() + 1).is_err());
    Ok(())
}

#[test]
fn random_data_lengths_stay_in_range() -> anyhow::Result<()> {
    init_logging();

    let field = p::random_data("seed", 3, 9).max_mutations(100).build()?;
    assert_eq!(field.num_mutations(), 100);
    assert_eq!(field.original_value(), b"seed");
    for candidate in field.library() {
        assert!((3..=9).contains(&candidate.len()), "{candidate:?}");
    }

    let fixed = p::random_data("", 8, 8).max_mutations(5).build()?;
    assert!(fixed.library().iter().all(|c| c.len() == 8));
    Ok(())
}

#[test]
fn random_data_with_step_has_deterministic_lengths() -> anyhow::Result<()> {
    let field = p::random_data("", 2, 11).step(3).build()?;
    let lengths: Vec<usize> = field.library().iter().map(Vec::len).collect();
    assert_eq!(lengths, [2, 5, 8, 11]);

    let clipped = p::random_data("", 0, 5).step(2).build()?;
    let lengths: Vec<usize> = clipped.library().iter().map(Vec::len).collect();
    assert_eq!(lengths, [0, 2, 4, 5]);

    let single = p::random_data("", 4, 4).step(16).build()?;
    assert_eq!(single.num_mutations(), 1);

    let huge_step = p::random_data("", 5, 10).step(usize::MAX).build()?;
    let lengths: Vec<usize> = huge_step.library().iter().map(Vec::len).collect();
    assert_eq!(lengths, [5, 10]);
    Ok(())
}

#[test]
fn random_data_rejects_bad_ranges() -> anyhow::Result<()> {
    assert!(p::random_data("", 5, 4).build().unwrap_err().is_invalid_range());
    assert!(p::random_data("", 0, 4)
        .step(0)
        .build()
        .unwrap_err()
        .is_invalid_range());
    Ok(())
}

#[test]
fn random_data_is_reproducible_per_seed() -> anyhow::Result<()> {
    let a = Session::new().seed(7).random_data("", 0, 32).build()?;
    let b = Session::new().seed(7).random_data("", 0, 32).build()?;
    assert_eq!(a.library(), b.library());

    let c = Session::new().seed(8).random_data("", 0, 32).build()?;
    assert_ne!(a.library(), c.library());

    // Without a shared generator, every field starts from the default seed.
    let d = p::random_data("", 0, 32).build()?;
    let e = p::random_data("", 0, 32).build()?;
    assert_eq!(d.library(), e.library());

    // Fields drawn from one session are independent.
    let mut session = Session::new();
    let f = session.random_data("", 0, 32).build()?;
    let g = session.random_data("", 0, 32).build()?;
    assert_ne!(f.library(), g.library());
    Ok(())
}

#[test]
fn session_max_mutations_is_the_default_library_size() -> anyhow::Result<()> {
    let mut session = Session::new().max_mutations(3);
    assert_eq!(session.random_data("", 1, 2).build()?.num_mutations(), 3);
    assert_eq!(
        session
            .random_data("", 1, 2)
            .max_mutations(6)
            .build()?
            .num_mutations(),
        6
    );
    assert_eq!(
        p::random_data("", 1, 2).build()?.num_mutations(),
        protomut::DEFAULT_MAX_MUTATIONS
    );
    Ok(())
}

#[test]
fn metadata() -> anyhow::Result<()> {
    let mut field = p::group("abc", ["de"]).named("meta")?;
    assert_eq!(field.name(), Some("meta"));
    assert_eq!(field.len(), 3);
    field.advance();
    assert_eq!(field.len(), 2);
    assert_eq!(field.original_value(), b"abc");

    assert!(!field.is_disabled());
    field.set_disabled(true);
    assert!(field.is_disabled());

    let debug = format!("{field:?}");
    assert!(debug.contains("meta"), "{debug}");
    Ok(())
}

#[test]
fn random_data_can_share_a_session_rng() -> anyhow::Result<()> {
    let mut session = Session::new().seed(99);
    let a = p::random_data("", 4, 4).max_mutations(2).rng(session.rng()).build()?;
    let b = p::random_data("", 4, 4).max_mutations(2).rng(session.rng()).build()?;
    // Drawing from the same generator moves it forward.
    assert_ne!(a.library(), b.library());

    let mut replay = Session::new().seed(99);
    let c = replay.random_data("", 4, 4).max_mutations(2).build()?;
    assert_eq!(a.library(), c.library());
    Ok(())
}
