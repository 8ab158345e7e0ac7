use protomut::legos::xdr::{self, XdrString};
use protomut::{primitives as p, Block, Compare, Dependency, Encode, Fuzz, Node, RenderOptions};

fn nested() -> anyhow::Result<Block> {
    Ok(Block::new()
        .named("outer")?
        .child(p::group("a", ["b"]).named("first")?)
        .child(
            Block::new()
                .named("inner")?
                .child(p::group("c", ["d", "e"]).named("second")?)
                .child(p::fixed("-")),
        )
        .child(p::group("f", ["g"]).named("third")?))
}

fn mutated_leaves(block: &Block) -> usize {
    block
        .fuzzable_mutants()
        .iter()
        .filter(|m| m.mutant_index() > 0)
        .count()
}

#[test]
fn num_mutations_sums_fuzzable_children() -> anyhow::Result<()> {
    let block = nested()?;
    assert_eq!(block.num_mutations(), 4);

    let framing = Block::new()
        .child(p::fixed("abc"))
        .child(p::group("x", ["y", "z"]).fuzzable(false));
    assert_eq!(framing.num_mutations(), 0);
    Ok(())
}

#[test]
fn enumeration_mutates_one_leaf_at_a_time() -> anyhow::Result<()> {
    let mut block = nested()?;
    assert_eq!(block.render(), b"ac-f");

    let mut seen = vec![];
    while block.advance() {
        assert_eq!(mutated_leaves(&block), 1);
        seen.push(String::from_utf8(block.render())?);
    }
    assert_eq!(seen, ["bc-f", "ad-f", "ae-f", "ac-g"]);

    assert_eq!(block.mutant_index(), 0);
    assert_eq!(mutated_leaves(&block), 0);
    assert_eq!(block.render(), b"ac-f");
    Ok(())
}

#[test]
fn goto_matches_replay() -> anyhow::Result<()> {
    let mut seeked = nested()?;
    let mut replayed = nested()?;

    for index in 0..=seeked.num_mutations() {
        seeked.goto(index)?;
        replayed.reset();
        for _ in 0..index {
            assert!(replayed.advance());
        }
        assert_eq!(seeked.render(), replayed.render(), "mutation {index}");
        assert_eq!(seeked.mutant_index(), index);
        assert_eq!(mutated_leaves(&seeked), usize::from(index > 0));

        // Advancing after a seek continues like the replay does.
        assert_eq!(seeked.advance(), replayed.advance());
        assert_eq!(seeked.render(), replayed.render());
    }

    assert!(seeked.goto(5).unwrap_err().is_out_of_range());
    Ok(())
}

#[test]
fn non_fuzzable_children_are_skipped() -> anyhow::Result<()> {
    let mut block = Block::new()
        .child(p::group("1", ["one"]).fuzzable(false))
        .child(p::group("2", ["two"]));

    let cases: Vec<Vec<u8>> = block.mutations(0)?.collect();
    assert_eq!(cases, [b"1two"]);
    Ok(())
}

#[test]
fn empty_block() -> anyhow::Result<()> {
    let mut block = Block::new();
    assert!(block.is_empty());
    assert_eq!(block.num_mutations(), 0);
    assert!(!block.advance());
    assert_eq!(block.mutations(0)?.count(), 0);
    block.goto(0)?;
    assert!(block.goto(1).is_err());
    Ok(())
}

#[test]
fn render_options_apply_to_the_whole_subtree() -> anyhow::Result<()> {
    let mut block = nested()?;
    block.goto(2)?;
    assert_eq!(block.render(), b"ad-f");
    assert_eq!(block.render_original(), b"ac-f");
    assert_eq!(block.len(), 4);

    let replaced = block.render_with(&RenderOptions::new().replace("inner", b"[x]"));
    assert_eq!(replaced, b"a[x]f");

    let replaced = block.render_with(&RenderOptions::new().replace("second", b"zz"));
    assert_eq!(replaced, b"azz-f");
    Ok(())
}

#[test]
fn find_and_fuzzable_mutants() -> anyhow::Result<()> {
    let block = nested()?;
    let second = block.find("second").and_then(Node::as_mutant);
    assert_eq!(second.map(|m| m.original_value()), Some(&b"c"[..]));
    assert!(block.find("inner").and_then(Node::as_block).is_some());
    assert!(block.find("missing").is_none());

    let names: Vec<_> = block
        .fuzzable_mutants()
        .iter()
        .map(|m| m.name())
        .collect();
    assert_eq!(names, [Some("first"), Some("second"), Some("third")]);
    Ok(())
}

#[test]
fn encoder_transforms_concatenated_render() -> anyhow::Result<()> {
    let mut block = Block::new()
        .child(p::group("ab", ["xyz"]))
        .child(p::fixed("c"))
        .encoder(|payload: Vec<u8>| {
            let mut framed = vec![u8::try_from(payload.len()).unwrap_or(u8::MAX)];
            framed.extend(payload);
            framed
        });

    assert_eq!(block.render(), b"\x03abc");
    block.advance();
    assert_eq!(block.render(), b"\x04xyzc");
    Ok(())
}

fn gated(dependency: Dependency) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut block = Block::new()
        .child(p::group(b"\x05", [b"\x01", b"\x09"]).named("len")?)
        .child(Block::new().depends_on(dependency).child(p::fixed("X")));

    let mut renders = vec![block.render()];
    renders.extend(block.mutations(0)?);
    Ok(renders)
}

fn gated_on(compare: Compare) -> anyhow::Result<Vec<Vec<u8>>> {
    gated(Dependency::new("len", compare, b"\x05"))
}

// Ordered comparators read `value <op> field`.
#[test]
fn dependency_comparators() -> anyhow::Result<()> {
    let cases: [(Compare, [&[u8]; 3]); 6] = [
        (Compare::Eq, [b"\x05X", b"\x01", b"\x09"]),
        (Compare::Ne, [b"\x05", b"\x01X", b"\x09X"]),
        (Compare::Gt, [b"\x05", b"\x01X", b"\x09"]),
        (Compare::Ge, [b"\x05X", b"\x01X", b"\x09"]),
        (Compare::Lt, [b"\x05", b"\x01", b"\x09X"]),
        (Compare::Le, [b"\x05X", b"\x01", b"\x09X"]),
    ];
    for (compare, expected) in cases {
        assert_eq!(gated_on(compare)?, expected, "{compare:?}");
    }
    Ok(())
}

#[test]
fn dependency_value_sets() -> anyhow::Result<()> {
    let one_of = Dependency::any_of("len", Compare::Eq, [b"\x01", b"\x09"]);
    assert_eq!(
        gated(one_of)?,
        [&b"\x05"[..], b"\x01X", b"\x09X"]
    );

    let none_of = Dependency::any_of("len", Compare::Ne, [b"\x01", b"\x09"]);
    assert_eq!(
        gated(none_of)?,
        [&b"\x05X"[..], b"\x01", b"\x09"]
    );

    // Ordered comparators are met if they hold for any value.
    let above_any = Dependency::any_of("len", Compare::Lt, [b"\x02", b"\x06"]);
    assert_eq!(
        gated(above_any)?,
        [&b"\x05X"[..], b"\x01", b"\x09X"]
    );
    Ok(())
}

#[test]
fn ordered_comparisons_are_lexicographic() -> anyhow::Result<()> {
    let big_endian = Dependency::new("n", Compare::Gt, 0x00ff_u16.to_be_bytes());
    assert!(big_endian.is_met(&0x00fe_u16.to_be_bytes()));
    assert!(!big_endian.is_met(&0x00ff_u16.to_be_bytes()));
    assert!(!big_endian.is_met(&0x0100_u16.to_be_bytes()));

    // A shorter prefix sorts first.
    let prefix = Dependency::new("s", Compare::Lt, "abc");
    assert!(prefix.is_met(b"abcd"));
    assert!(!prefix.is_met(b"ab"));
    Ok(())
}

#[test]
fn dependency_on_unknown_field_renders_nothing() -> anyhow::Result<()> {
    let block = Block::new()
        .child(p::fixed("head"))
        .child(
            Block::new()
                .depends_on(Dependency::new("nowhere", Compare::Eq, "x"))
                .child(p::fixed("body")),
        );
    assert_eq!(block.render(), b"head");
    Ok(())
}

#[test]
fn comparators_parse_from_operators() -> anyhow::Result<()> {
    let parsed: Vec<Compare> = ["==", "!=", ">", ">=", "<", "<="]
        .iter()
        .map(|s| s.parse())
        .collect::<protomut::Result<_>>()?;
    assert_eq!(
        parsed,
        [
            Compare::Eq,
            Compare::Ne,
            Compare::Gt,
            Compare::Ge,
            Compare::Lt,
            Compare::Le
        ]
    );
    assert!("=>".parse::<Compare>().is_err());
    Ok(())
}

#[test]
fn xdr_string_encoding() -> anyhow::Result<()> {
    assert_eq!(XdrString.encode(b"AB".to_vec()), b"\0\0\0\x02AB\0\0");
    assert_eq!(XdrString.encode(Vec::new()), b"\0\0\0\0");
    assert_eq!(XdrString.encode(b"ABCD".to_vec()), b"\0\0\0\x04ABCD");
    assert_eq!(
        XdrString.encode(b"ABCDE".to_vec()),
        b"\0\0\0\x05ABCDE\0\0\0"
    );
    assert_eq!(
        [0, 1, 2, 3, 4, 5].map(xdr::padding),
        [0, 3, 2, 1, 0, 3]
    );
    Ok(())
}

#[test]
fn xdr_string_lego_fuzzes_its_field() -> anyhow::Result<()> {
    let mut lego = xdr::string("name", p::group("", ["A", "ABCD"]))?;
    assert_eq!(lego.name(), Some("name"));
    assert_eq!(lego.render(), b"\0\0\0\0");

    let cases: Vec<Vec<u8>> = lego.mutations(0)?.collect();
    assert_eq!(cases, [&b"\0\0\0\x01A\0\0\0"[..], b"\0\0\0\x04ABCD"]);

    assert!(xdr::string("bad name", p::fixed("")).is_err());
    Ok(())
}

#[test]
fn dependency_on_enclosing_block_renders_without_recursing() -> anyhow::Result<()> {
    let block = Block::new()
        .named("outer")?
        .child(p::fixed("head"))
        .child(
            Block::new()
                .depends_on(Dependency::new("outer", Compare::Ne, "zzz"))
                .child(p::fixed("-tail")),
        );

    // Resolving `outer` renders the inner block, which cannot see `outer`
    // while it is being resolved and so renders nothing there.
    assert_eq!(block.render(), b"head-tail");
    Ok(())
}
