/*!

# Modeling Messages

A message is modeled as a tree. Leaves are [`Mutant`][crate::Mutant] fields,
built with the constructors in [`primitives`][crate::primitives]. Interior
nodes are [`Block`][crate::Block]s, which concatenate their children's renders
and optionally pass the result through an [`Encode`][crate::Encode]r.

Every leaf has an original value plus a finite library of replacement values.
The tree enumerates its test cases one field at a time: at every step exactly
one leaf shows a library value and every other leaf shows its original value.
The number of test cases of a tree is the sum of its fuzzable leaves' library
sizes.

## Assembling a Request

A [`Request`][crate::Request] is the root of one message. It keeps a stack of
open blocks and pushes every new item into the innermost one, so a message can
be written top to bottom, in the order its bytes appear:

```
# fn foo() -> protomut::Result<()> {
use protomut::{primitives as p, Block, Request};

let request = Request::new("modeling_login")?;
request.push(p::group("LOGIN", ["login", "LOGOUT"]).named("command")?)?;
request.push(p::fixed(" "))?;

request.open_block(Block::new().named("credentials")?)?;
request.push(p::group("guest", ["admin", "root"]).named("user")?)?;
request.push(p::fixed(":"))?;
request.push(p::random_data("hunter2", 0, 64).named("password").build()?)?;
request.close_block()?;

request.push(p::fixed("\r\n"))?;

assert!(request.is_assembled());
assert_eq!(request.render(), b"LOGIN guest:hunter2\r\n");
assert_eq!(request.num_mutations(), 2 + 2 + 25);
# Ok(())
# }
# foo().unwrap();
```

Names are unique within a request. Pushing a second element named `user` fails
with a [`DuplicateName`][crate::ErrorKind::DuplicateName] error, and closing
more blocks than were opened fails with a
[`StackUnderflow`][crate::ErrorKind::StackUnderflow] error.

## Conditional Blocks

A block can depend on the current value of another named field. While the
[`Dependency`][crate::Dependency] is not met, the block renders nothing:

```
# fn foo() -> protomut::Result<()> {
use protomut::{primitives as p, Block, Compare, Dependency, Request};

let request = Request::new("modeling_options")?;
request.push(p::group(b"\x00", [b"\x01"]).named("has_options")?)?;
request.open_block(
    Block::new()
        .named("options")?
        .depends_on(Dependency::new("has_options", Compare::Eq, b"\x01")),
)?;
request.push(p::group("gzip", ["br"]))?;
request.close_block()?;

assert_eq!(request.render(), b"\x00");

let cases: Vec<Vec<u8>> = request.mutations(0)?.map(|m| m.buffer).collect();
assert_eq!(cases, [&b"\x01gzip"[..], b"\x00"]);
# Ok(())
# }
# foo().unwrap();
```

## Encoded Blocks

An encoder reshapes a block's render, for example to prefix it with its
length. The [`legos`][crate::legos] module has ready-made ones:

```
# fn foo() -> protomut::Result<()> {
use protomut::{legos::xdr, primitives as p, Request};

let request = Request::new("modeling_xdr")?;
request.push(xdr::string("path", p::group("/tmp", ["/etc/passwd"]))?)?;

assert_eq!(request.render(), b"\x00\x00\x00\x04/tmp");
# Ok(())
# }
# foo().unwrap();
```

 */
