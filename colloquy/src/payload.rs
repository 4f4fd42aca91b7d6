//! Runtime descriptions of the types of values a session carries.
//!
//! A [`Payload`] names the type of a single message. A [`PayloadSet`] is the closed set of all the
//! message types a protocol will ever carry, which a transport shared by both directions of a
//! session (such as a mailbox) uses as the universe of tags for the value currently in flight.

use std::{
    any::{self, Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

use crate::{backend::Choice, Protocol};

/// The type of a message carried by a [`Send`](Protocol::Send) or [`Recv`](Protocol::Recv).
///
/// Two payloads are equal exactly when they describe the same Rust type; the recorded name is only
/// used for display.
///
/// # Examples
///
/// ```
/// use colloquy::Payload;
///
/// assert_eq!(Payload::of::<String>(), Payload::of::<String>());
/// assert_ne!(Payload::of::<i64>(), Payload::of::<i32>());
/// assert_eq!(Payload::of::<Vec<String>>().to_string(), "Vec<String>");
/// ```
#[derive(Clone, Copy)]
pub struct Payload {
    id: TypeId,
    name: &'static str,
}

impl Payload {
    /// The payload describing `T`.
    pub fn of<T: Any>() -> Payload {
        Payload {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    /// Does this payload describe `T`?
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// The [`TypeId`] of the described type.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified name of the described type.
    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Payload {}

impl Hash for Payload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Payload({})", self.name)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&unqualified(self.name))
    }
}

/// Strip module paths from every path segment in a type name, so that
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
fn unqualified(name: &str) -> String {
    let mut short = String::with_capacity(name.len());
    let mut segment_start = 0;
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek() == Some(&':') => {
                let _ = chars.next();
                short.truncate(segment_start);
            }
            c if c.is_alphanumeric() || c == '_' => short.push(c),
            c => {
                short.push(c);
                segment_start = short.len();
            }
        }
    }
    short
}

/// One member of a [`PayloadSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// A message of this type may be in flight.
    Value(Payload),
    /// The session may finish.
    Done,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Tag::Value(payload) => payload.fmt(f),
            Tag::Done => write!(f, "Done"),
        }
    }
}

/// The closed, deduplicated set of types a protocol carries, in order of first appearance.
///
/// The set is computed by walking one unrolling of the protocol: the bodies of loops are visited
/// once, and a [`Continue`](Protocol::Continue) ends the walk along its path. Both branches of a
/// choice are visited (the left before the right), and a choice also carries its [`Choice`]
/// discriminant. Reaching [`Done`](Protocol::Done) adds the terminal marker [`Tag::Done`].
///
/// The position of a tag in the set is its identity: transports which store "whichever value is
/// currently in flight" use it to check that the value read is of the type the reader expects.
///
/// # Examples
///
/// ```
/// use colloquy::{Payload, PayloadSet, Protocol, Tag};
///
/// let p = Protocol::send::<String>(Protocol::recv::<i64>(Protocol::send::<String>(Protocol::Done)));
/// let set = PayloadSet::of(&p);
///
/// assert_eq!(set.tags(), &[
///     Tag::Value(Payload::of::<String>()),
///     Tag::Value(Payload::of::<i64>()),
///     Tag::Done,
/// ]);
/// assert_eq!(set.tag_of(&Payload::of::<i64>()), Some(1));
/// assert_eq!(set.to_string(), "{String, i64, Done}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PayloadSet {
    tags: Vec<Tag>,
}

impl PayloadSet {
    /// Compute the set of payloads carried by `protocol`.
    pub fn of(protocol: &Protocol) -> PayloadSet {
        let mut set = PayloadSet::default();
        set.collect(protocol);
        set
    }

    fn collect(&mut self, protocol: &Protocol) {
        use Protocol::*;
        match protocol {
            Done => self.insert(Tag::Done),
            Recv(t, p) | Send(t, p) => {
                self.insert(Tag::Value(*t));
                self.collect(p);
            }
            Loop(p) => self.collect(p),
            Continue(_) => {}
            Choose(p, q) | Offer(p, q) => {
                self.insert(Tag::Value(Payload::of::<Choice>()));
                self.collect(p);
                self.collect(q);
            }
        }
    }

    fn insert(&mut self, tag: Tag) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// All the tags in the set, in order of first appearance.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// The tag identifying `payload`, if it is carried at all.
    pub fn tag_of(&self, payload: &Payload) -> Option<usize> {
        self.tags
            .iter()
            .position(|tag| matches!(tag, Tag::Value(p) if p == payload))
    }

    /// Is `payload` carried by the protocol?
    pub fn contains(&self, payload: &Payload) -> bool {
        self.tag_of(payload).is_some()
    }

    /// Can the protocol finish?
    pub fn terminates(&self) -> bool {
        self.tags.contains(&Tag::Done)
    }

    /// The number of tags, including the terminal marker if present.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Is the set empty? (Only the protocol `Loop<Continue>` carries nothing at all.)
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over the payload types in the set, skipping the terminal marker.
    pub fn payloads(&self) -> impl Iterator<Item = Payload> + '_ {
        self.tags.iter().filter_map(|tag| match tag {
            Tag::Value(payload) => Some(*payload),
            Tag::Done => None,
        })
    }
}

impl fmt::Display for PayloadSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", tag)?;
        }
        write!(f, "}}")
    }
}
