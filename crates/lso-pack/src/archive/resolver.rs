//! Back-reference resolution for keyed archives.
//!
//! A keyed archive flattens its object graph into a table; every nested
//! object is replaced by a [`Value::Reference`] to its table index. The
//! resolver walks the graph depth-first and substitutes each reference with
//! the resolved table entry. The graph is not guaranteed to be acyclic, so
//! the indices on the current path are tracked and a revisit yields a
//! [`Placeholder::Cyclic`] instead of recursing.
//!
//! Two budgets bound the walk. Every container level and every followed
//! reference counts against `max_depth`, so native recursion stays shallow
//! however the table nests. Every materialized node counts against
//! `max_nodes`, so objects shared along many paths cannot blow the output
//! up exponentially.

use crate::value::{Mapping, Placeholder, Value};

/// Key naming the archived class of an object; dropped from the output.
pub const CLASS_KEY: &str = "$class";

pub const DEFAULT_MAX_DEPTH: usize = 512;
pub const DEFAULT_MAX_NODES: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Deepest combined nesting of containers and followed references
    /// before substituting [`Placeholder::DepthLimit`].
    pub max_depth: usize,
    /// Nodes materialized in total before substituting
    /// [`Placeholder::NodeLimit`].
    pub max_nodes: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Resolves `root` against `table` with the default options.
pub fn resolve(root: &Value, table: &[Value]) -> Value {
    resolve_with(root, table, &ResolveOptions::default())
}

/// Resolves every reference reachable from `root`.
///
/// Always returns a value. References outside the table become
/// [`Placeholder::Dangling`], references back into the current path become
/// [`Placeholder::Cyclic`], and exhausted budgets leave
/// [`Placeholder::DepthLimit`] or [`Placeholder::NodeLimit`]; siblings of a
/// placeholder resolve normally.
pub fn resolve_with(root: &Value, table: &[Value], options: &ResolveOptions) -> Value {
    Resolver::new(table, options).walk(root).value
}

struct Walked {
    value: Value,
    /// The value contains a cyclic or budget placeholder, so it depends on
    /// the path it was reached from and must not be reused elsewhere.
    path_dependent: bool,
}

impl Walked {
    fn fixed(value: Value) -> Self {
        Self {
            value,
            path_dependent: false,
        }
    }

    fn limited(placeholder: Placeholder) -> Self {
        Self {
            value: Value::Placeholder(placeholder),
            path_dependent: true,
        }
    }
}

/// A resolved table entry that is the same from every path.
struct Memo {
    value: Value,
    nodes: usize,
    /// Depth levels the entry occupies, counting the reference itself.
    span: usize,
}

struct Resolver<'t> {
    table: &'t [Value],
    on_path: Vec<bool>,
    /// Entries resolved once already; a second resolution is memoized.
    seen: Vec<bool>,
    memo: Vec<Option<Memo>>,
    depth: usize,
    /// Deepest level reached so far, for measuring memo spans.
    deepest: usize,
    max_depth: usize,
    nodes: usize,
    max_nodes: usize,
    /// Index of the table entry being resolved.
    current: u64,
}

impl<'t> Resolver<'t> {
    fn new(table: &'t [Value], options: &ResolveOptions) -> Self {
        Self {
            table,
            on_path: vec![false; table.len()],
            seen: vec![false; table.len()],
            memo: std::iter::repeat_with(|| None).take(table.len()).collect(),
            depth: 0,
            deepest: 0,
            max_depth: options.max_depth,
            nodes: 0,
            max_nodes: options.max_nodes,
            current: 0,
        }
    }

    fn descend(&mut self) {
        self.depth += 1;
        self.deepest = self.deepest.max(self.depth);
    }

    fn walk(&mut self, value: &Value) -> Walked {
        if let Value::Reference(uid) = value {
            return self.follow(*uid);
        }
        if self.nodes >= self.max_nodes {
            log::debug!("node budget of {} exhausted in {}", self.max_nodes, self.current);
            return Walked::limited(Placeholder::NodeLimit(self.current));
        }
        match value {
            Value::Mapping(_) | Value::Sequence(_) if self.depth >= self.max_depth => {
                log::debug!("object {} nests deeper than {}", self.current, self.max_depth);
                Walked::limited(Placeholder::DepthLimit(self.current))
            }
            Value::Mapping(map) => {
                self.nodes += 1;
                self.descend();
                let mut out = Mapping::with_capacity(map.len());
                let mut path_dependent = false;
                for (key, item) in map {
                    if key == CLASS_KEY {
                        continue;
                    }
                    let walked = self.walk(item);
                    path_dependent |= walked.path_dependent;
                    out.insert(key.clone(), walked.value);
                }
                self.depth -= 1;
                Walked {
                    value: Value::Mapping(out),
                    path_dependent,
                }
            }
            Value::Sequence(items) => {
                self.nodes += 1;
                self.descend();
                let mut out = Vec::with_capacity(items.len());
                let mut path_dependent = false;
                for item in items {
                    let walked = self.walk(item);
                    path_dependent |= walked.path_dependent;
                    out.push(walked.value);
                }
                self.depth -= 1;
                Walked {
                    value: Value::Sequence(out),
                    path_dependent,
                }
            }
            scalar => {
                self.nodes += 1;
                Walked::fixed(scalar.clone())
            }
        }
    }

    fn follow(&mut self, uid: u64) -> Walked {
        let Some(idx) = usize::try_from(uid).ok().filter(|&i| i < self.table.len()) else {
            log::debug!("dangling reference {uid} (table has {} objects)", self.table.len());
            return Walked::fixed(Value::Placeholder(Placeholder::Dangling(uid)));
        };
        if self.on_path[idx] {
            log::debug!("cyclic reference {uid}");
            return Walked::limited(Placeholder::Cyclic(uid));
        }
        if let Some(memo) = &self.memo[idx] {
            let fits_depth = self.depth + memo.span <= self.max_depth;
            let fits_nodes = memo.nodes <= self.max_nodes - self.nodes;
            if fits_depth && fits_nodes {
                self.nodes += memo.nodes;
                self.deepest = self.deepest.max(self.depth + memo.span);
                return Walked::fixed(memo.value.clone());
            }
        }
        if self.depth >= self.max_depth {
            log::debug!("reference {uid} exceeds depth {}", self.max_depth);
            return Walked::limited(Placeholder::DepthLimit(uid));
        }

        let table = self.table;
        let entry_depth = self.depth;
        let entry_nodes = self.nodes;
        let outer_deepest = self.deepest;
        let outer_current = self.current;
        self.deepest = entry_depth;
        self.on_path[idx] = true;
        self.current = uid;
        self.descend();
        let walked = self.walk(&table[idx]);
        self.depth -= 1;
        self.current = outer_current;
        self.on_path[idx] = false;
        let span = self.deepest - entry_depth;
        self.deepest = self.deepest.max(outer_deepest);

        if !walked.path_dependent {
            if self.seen[idx] {
                self.memo[idx] = Some(Memo {
                    value: walked.value.clone(),
                    nodes: self.nodes - entry_nodes,
                    span,
                });
            } else {
                self.seen[idx] = true;
            }
        }
        walked
    }
}
