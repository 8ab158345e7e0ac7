/*!

# Driving an Enumeration

[`Request::mutations`][crate::Request::mutations] returns a lazy iterator of
[`Mutation`][crate::Mutation]s. Each one carries its 1-based index, a handle to
the field it mutated, and the rendered bytes to send to the target.

A typical fuzzing loop sends each buffer, reads the reply, and classifies it
with the request's response matchers:

```
# fn foo() -> protomut::Result<()> {
use protomut::{primitives as p, response::Prefix, Request};
use std::sync::Arc;

let request = Request::new("driving_ping")?;
request.push(p::group("PING", ["PONG", "P1NG"]).named("verb")?)?;
request.push(p::fixed("\r\n"))?;
request.add_response(Arc::new(Prefix::new("ok", "+OK")));
request.add_response(Arc::new(Prefix::new("error", "-ERR")));

# let send_and_receive = |buffer: &[u8]| -> Vec<u8> {
#     if buffer.starts_with(b"PING") { b"+OK\r\n".to_vec() } else { b"-ERR bad verb\r\n".to_vec() }
# };
for mutation in request.mutations(0)? {
    let reply = send_and_receive(&mutation.buffer);
    let parsed = request.match_response(&reply)?;
    assert_eq!(parsed.name(), "error");
    assert_eq!(mutation.element.name().as_deref(), Some("verb"));
}
# Ok(())
# }
# foo().unwrap();
```

When the iterator finishes, every field is back at its original value.

## Resuming

The enumeration is deterministic: the same request yields the same test cases
in the same order every time, as long as any random data fields were built
from the same seed. A crashed or interrupted run can therefore resume where it
left off. [`Request::goto`][crate::Request::goto] positions the request at any
index without visiting the steps before it, and `mutations(start)` resumes
right after `start`:

```
# fn foo() -> protomut::Result<()> {
use protomut::{primitives as p, Request};

let request = Request::new("driving_resume")?;
request.push(p::group("a", ["b", "c"]))?;
request.push(p::group("x", ["y", "z"]))?;

request.goto(3)?;
assert_eq!(request.render(), b"ay");

let rest: Vec<usize> = request.mutations(3)?.map(|m| m.index).collect();
assert_eq!(rest, [4]);
# Ok(())
# }
# foo().unwrap();
```

## Reproducing a Test Case

Random data libraries are drawn from a [`Session`][crate::Session]'s seeded
generator. Two sessions with the same seed build identical requests:

```
# fn foo() -> protomut::Result<()> {
use protomut::Session;

let mut first = Session::new().seed(42);
let mut second = Session::new().seed(42);

let a = first.random_data("", 1, 8).build()?;
let b = second.random_data("", 1, 8).build()?;
assert_eq!(a.library(), b.library());
# Ok(())
# }
# foo().unwrap();
```

 */
