//! Lexical scope binding for Go source.
//!
//! Two passes over one parse tree:
//!
//! 1. **Definition pass**: builds an arena of [`Scope`]s (each pointing at its
//!    parent by index) and records every [`Definition`] in the scope that
//!    declares it.
//! 2. **Use pass**: walks the tree again and resolves each identifier
//!    occurrence through the scope chain to the definition it denotes.
//!
//! Resolution follows Go's block rules: package-level names are visible in the
//! whole file, local names only after their declaration, labels within their
//! function. Struct fields and methods are *members*: they are not lexically
//! visible and a selector `x.f` binds to a member only when the file defines
//! exactly one member named `f` (there is no type information to do better).

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use super::parser::ParsedFile;
use super::{Range, ReferenceKind};

/// Index of a scope in [`Bindings::scopes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

/// Index of a definition in [`Bindings::definitions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub usize);

/// What introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The file (package block).
    Package,
    /// Function, method or function literal, including its body block.
    Function,
    /// A braced block.
    Block,
    /// The implicit block of an if, for, switch or select statement.
    Statement,
    /// The implicit block of one case clause.
    Case,
    /// Parameter names of a function type or interface method; never searched
    /// from the surrounding code.
    Signature,
}

/// One lexical scope.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub range: Range,
    names: HashMap<String, Vec<DefId>>,
    labels: HashMap<String, DefId>,
}

/// Kind of a bound name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Function,
    Method,
    Type,
    TypeParameter,
    Variable,
    Constant,
    Parameter,
    Field,
    InterfaceMethod,
    Import,
    Label,
}

impl DefinitionKind {
    /// Members are reached through selectors, not lexical lookup.
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            DefinitionKind::Method | DefinitionKind::Field | DefinitionKind::InterfaceMethod
        )
    }

    pub fn reference_kind(&self) -> ReferenceKind {
        match self {
            DefinitionKind::Function | DefinitionKind::Method | DefinitionKind::InterfaceMethod => {
                ReferenceKind::Function
            }
            DefinitionKind::Type | DefinitionKind::TypeParameter => ReferenceKind::Type,
            DefinitionKind::Variable | DefinitionKind::Parameter | DefinitionKind::Field => {
                ReferenceKind::Variable
            }
            DefinitionKind::Constant => ReferenceKind::Constant,
            DefinitionKind::Import => ReferenceKind::Package,
            DefinitionKind::Label => ReferenceKind::Other,
        }
    }
}

/// A declaration site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionKind,
    pub scope: ScopeId,
    /// Range of the defining identifier (or import path for unaliased imports).
    pub range: Range,
    /// Byte offset from which the name is visible inside its scope.
    pub visible_from: usize,
}

/// A resolved identifier occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Use {
    pub definition: DefId,
    pub range: Range,
    /// The occurrence is the package qualifier of `pkg.Name`.
    pub qualified: bool,
}

/// Scopes, definitions and resolved uses for one file.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub scopes: Vec<Scope>,
    pub definitions: Vec<Definition>,
    pub uses: Vec<Use>,
    /// Import spec start byte -> the package name it binds.
    imports: HashMap<usize, DefId>,
    /// Definition index -> indices into `uses`, in traversal order.
    uses_by_definition: Vec<Vec<usize>>,
}

impl Bindings {
    /// Run both passes over a parsed file.
    pub fn build(parsed: &ParsedFile) -> Self {
        let mut binder = Binder::new(parsed);
        let root = parsed.root();
        let package = binder.open_scope(root, ScopeKind::Package, None);
        binder.walk_defs(root, package);

        binder.index_members();
        binder.walk_uses(root, package);
        binder.index_uses();

        tracing::trace!(
            scopes = binder.bindings.scopes.len(),
            definitions = binder.bindings.definitions.len(),
            uses = binder.bindings.uses.len(),
            "bound identifiers"
        );
        binder.bindings
    }

    pub fn definition(&self, id: DefId) -> &Definition {
        &self.definitions[id.0]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Uses of one definition, in traversal order.
    pub fn uses_of(&self, id: DefId) -> impl Iterator<Item = &Use> {
        self.uses_by_definition
            .get(id.0)
            .into_iter()
            .flatten()
            .map(move |&i| &self.uses[i])
    }

    /// The package name bound by the import spec starting at `spec_start`.
    ///
    /// `None` for blank and dot imports, which bind no name.
    pub fn import_binding(&self, spec_start: usize) -> Option<DefId> {
        self.imports.get(&spec_start).copied()
    }

    /// Whether some qualified access in the file binds to `id`.
    pub fn has_qualified_use(&self, id: DefId) -> bool {
        self.uses_of(id).any(|u| u.qualified)
    }

    /// Resolve `name` as seen from `scope` at byte offset `at`.
    pub fn lookup(&self, scope: ScopeId, name: &str, at: usize) -> Option<DefId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(ids) = scope.names.get(name) {
                let visible = ids
                    .iter()
                    .rev()
                    .find(|d| self.definition(**d).visible_from <= at);
                if let Some(def) = visible {
                    return Some(*def);
                }
            }
            current = scope.parent;
        }
        None
    }

    /// Resolve a label from inside `scope`; labels never cross a function.
    pub fn lookup_label(&self, scope: ScopeId, name: &str) -> Option<DefId> {
        let function = self.enclosing_function(scope)?;
        self.scope(function).labels.get(name).copied()
    }

    fn enclosing_function(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scope(id).kind == ScopeKind::Function {
                return Some(id);
            }
            current = self.scope(id).parent;
        }
        None
    }
}

struct Binder<'a> {
    parsed: &'a ParsedFile,
    bindings: Bindings,
    /// Node id -> scope the node opens.
    scope_for: HashMap<usize, ScopeId>,
    /// Node ids of identifiers that declare a name.
    def_sites: HashSet<usize>,
    members: HashMap<String, Vec<DefId>>,
}

impl<'a> Binder<'a> {
    fn new(parsed: &'a ParsedFile) -> Self {
        Self {
            parsed,
            bindings: Bindings::default(),
            scope_for: HashMap::new(),
            def_sites: HashSet::new(),
            members: HashMap::new(),
        }
    }

    fn open_scope(&mut self, node: Node, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.bindings.scopes.len());
        self.bindings.scopes.push(Scope {
            kind,
            parent,
            range: Range::from_node(node),
            names: HashMap::new(),
            labels: HashMap::new(),
        });
        self.scope_for.insert(node.id(), id);
        id
    }

    fn text(&self, node: Node) -> &'a str {
        self.parsed.node_text(node)
    }

    fn is_package_scope(&self, scope: ScopeId) -> bool {
        self.bindings.scope(scope).kind == ScopeKind::Package
    }

    /// Record a definition for the identifier `ident` in `scope`.
    fn define(
        &mut self,
        ident: Node,
        kind: DefinitionKind,
        scope: ScopeId,
        visible_from: usize,
    ) -> Option<DefId> {
        let name = self.text(ident);
        self.def_sites.insert(ident.id());
        if name.is_empty() || name == "_" {
            return None;
        }
        Some(self.push_definition(name.to_string(), kind, scope, Range::from_node(ident), visible_from))
    }

    fn push_definition(
        &mut self,
        name: String,
        kind: DefinitionKind,
        scope: ScopeId,
        range: Range,
        visible_from: usize,
    ) -> DefId {
        let visible_from = if self.is_package_scope(scope) { 0 } else { visible_from };
        let id = DefId(self.bindings.definitions.len());

        let entry = &mut self.bindings.scopes[scope.0];
        if kind == DefinitionKind::Label {
            entry.labels.insert(name.clone(), id);
        } else if !kind.is_member() {
            entry.names.entry(name.clone()).or_default().push(id);
        }

        self.bindings.definitions.push(Definition {
            name,
            kind,
            scope,
            range,
            visible_from,
        });
        id
    }

    /// Define every `name` field child of `node`.
    fn define_names(&mut self, node: Node, kind: DefinitionKind, scope: ScopeId, visible_from: usize) {
        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            self.define(name, kind, scope, visible_from);
        }
    }

    /// Define the identifiers of an `expression_list` introduced by `:=`.
    ///
    /// A name already declared in the same scope is reused (Go's redeclaration
    /// rule), so it becomes a use rather than a new definition.
    fn define_short_vars(&mut self, list: Node, scope: ScopeId, visible_from: usize) {
        let mut cursor = list.walk();
        let idents: Vec<Node> = list
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "identifier")
            .collect();
        for ident in idents {
            let name = self.text(ident);
            let redeclared = self.bindings.scope(scope).names.contains_key(name);
            if !redeclared {
                self.define(ident, DefinitionKind::Variable, scope, visible_from);
            }
        }
    }

    fn define_import(&mut self, spec: Node, scope: ScopeId) {
        let Some(path_node) = spec.child_by_field_name("path") else {
            return;
        };
        let path = unquote(self.text(path_node));

        let id = match spec.child_by_field_name("name") {
            Some(alias) if alias.kind() == "package_identifier" => {
                self.define(alias, DefinitionKind::Import, scope, 0)
            }
            // `_` and `.` bind nothing.
            Some(_) => None,
            None => {
                let name = default_package_name(path);
                if name.is_empty() {
                    return;
                }
                Some(self.push_definition(
                    name,
                    DefinitionKind::Import,
                    scope,
                    Range::from_node(path_node),
                    0,
                ))
            }
        };
        if let Some(id) = id {
            self.bindings.imports.insert(spec.start_byte(), id);
        }
    }

    fn has_token(node: Node, token: &str) -> bool {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).any(|c| !c.is_named() && c.kind() == token);
        found
    }

    // ------------------------------------------------------------------
    // Pass 1: definitions
    // ------------------------------------------------------------------

    /// Pre-order walk with an explicit stack; nesting depth is bounded only by
    /// the parser.
    fn walk_defs(&mut self, root: Node, scope: ScopeId) {
        let mut stack = vec![(root, scope)];
        while let Some((node, scope)) = stack.pop() {
            let Some(inner) = self.enter_definitions(node, scope) else {
                continue;
            };
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, inner)));
        }
    }

    /// Record what `node` declares; returns the scope its children live in,
    /// or `None` when the subtree declares nothing further.
    fn enter_definitions(&mut self, node: Node, scope: ScopeId) -> Option<ScopeId> {
        let mut scope = scope;

        match node.kind() {
            "package_clause" | "comment" => return None,
            "import_spec" => {
                self.define_import(node, scope);
                return None;
            }
            "function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.define(name, DefinitionKind::Function, scope, 0);
                }
                scope = self.open_scope(node, ScopeKind::Function, Some(scope));
            }
            "method_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.define(name, DefinitionKind::Method, scope, 0);
                }
                scope = self.open_scope(node, ScopeKind::Function, Some(scope));
            }
            "func_literal" => {
                scope = self.open_scope(node, ScopeKind::Function, Some(scope));
            }
            "function_type" => {
                scope = self.open_scope(node, ScopeKind::Signature, Some(scope));
            }
            "method_elem" | "method_spec" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.define(name, DefinitionKind::InterfaceMethod, scope, 0);
                }
                scope = self.open_scope(node, ScopeKind::Signature, Some(scope));
            }
            "block" => {
                let is_body = node
                    .parent()
                    .map(|p| {
                        matches!(
                            p.kind(),
                            "function_declaration" | "method_declaration" | "func_literal"
                        )
                    })
                    .unwrap_or(false);
                if !is_body {
                    scope = self.open_scope(node, ScopeKind::Block, Some(scope));
                }
            }
            "if_statement" | "for_statement" | "expression_switch_statement"
            | "type_switch_statement" | "select_statement" => {
                scope = self.open_scope(node, ScopeKind::Statement, Some(scope));
                if node.kind() == "type_switch_statement" {
                    if let Some(alias) = node.child_by_field_name("alias") {
                        self.define_short_vars(alias, scope, alias.end_byte());
                    }
                }
            }
            "expression_case" | "type_case" | "default_case" | "communication_case" => {
                scope = self.open_scope(node, ScopeKind::Case, Some(scope));
            }
            "parameter_declaration" | "variadic_parameter_declaration" => {
                self.define_names(node, DefinitionKind::Parameter, scope, node.start_byte());
            }
            "type_parameter_declaration" => {
                self.define_names(node, DefinitionKind::TypeParameter, scope, node.start_byte());
            }
            "type_spec" | "type_alias" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.define(name, DefinitionKind::Type, scope, name.start_byte());
                }
                scope = self.open_scope(node, ScopeKind::Block, Some(scope));
            }
            "field_declaration" => {
                self.define_names(node, DefinitionKind::Field, scope, 0);
            }
            "var_spec" => {
                self.define_names(node, DefinitionKind::Variable, scope, node.end_byte());
            }
            "const_spec" => {
                self.define_names(node, DefinitionKind::Constant, scope, node.end_byte());
            }
            "short_var_declaration" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.define_short_vars(left, scope, node.end_byte());
                }
            }
            "range_clause" | "receive_statement" => {
                if Self::has_token(node, ":=") {
                    if let Some(left) = node.child_by_field_name("left") {
                        self.define_short_vars(left, scope, node.end_byte());
                    }
                }
            }
            "labeled_statement" => {
                if let Some(label) = node.child_by_field_name("label") {
                    let target = self.bindings.enclosing_function(scope).unwrap_or(scope);
                    self.define(label, DefinitionKind::Label, target, 0);
                }
            }
            _ => {}
        }

        Some(scope)
    }

    fn index_uses(&mut self) {
        let mut index = vec![Vec::new(); self.bindings.definitions.len()];
        for (i, u) in self.bindings.uses.iter().enumerate() {
            index[u.definition.0].push(i);
        }
        self.bindings.uses_by_definition = index;
    }

    fn index_members(&mut self) {
        for (i, def) in self.bindings.definitions.iter().enumerate() {
            if def.kind.is_member() {
                self.members.entry(def.name.clone()).or_default().push(DefId(i));
            }
        }
    }

    // ------------------------------------------------------------------
    // Pass 2: uses
    // ------------------------------------------------------------------

    /// Pre-order walk with an explicit stack. Uses are recorded in source
    /// order: a selector's field is resolved after its operand subtree.
    fn walk_uses(&mut self, root: Node<'a>, scope: ScopeId) {
        let mut stack = vec![UseStep::Visit(root, scope)];
        while let Some(step) = stack.pop() {
            let (node, scope) = match step {
                UseStep::Visit(node, scope) => (node, scope),
                UseStep::Field(field) => {
                    self.use_member(field);
                    continue;
                }
            };
            let scope = self.scope_for.get(&node.id()).copied().unwrap_or(scope);

            match node.kind() {
                "package_clause" | "import_declaration" | "comment" => continue,
                "identifier" | "type_identifier" => {
                    self.use_identifier(node, scope);
                    continue;
                }
                "package_identifier" => {
                    // Qualifier of a qualified type (`pkg.Type`).
                    self.use_name(node, scope, true);
                    continue;
                }
                "label_name" => {
                    if !self.def_sites.contains(&node.id()) {
                        if let Some(def) = self.bindings.lookup_label(scope, self.text(node)) {
                            self.record(def, node, false);
                        }
                    }
                    continue;
                }
                "selector_expression" => {
                    self.use_selector(node, scope, &mut stack);
                    continue;
                }
                _ => {}
            }

            let mut cursor = node.walk();
            let children: Vec<Node<'a>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev().map(|child| UseStep::Visit(child, scope)));
        }
    }

    fn use_identifier(&mut self, node: Node, scope: ScopeId) {
        if self.def_sites.contains(&node.id()) || is_struct_literal_key(node) {
            return;
        }
        self.use_name(node, scope, false);
    }

    /// Resolve a name lexically; returns the definition it bound to.
    fn use_name(&mut self, node: Node, scope: ScopeId, qualified: bool) -> Option<DefId> {
        let name = self.text(node);
        if name == "_" {
            return None;
        }
        let def = self.bindings.lookup(scope, name, node.start_byte())?;
        let qualified = qualified && self.bindings.definition(def).kind == DefinitionKind::Import;
        self.record(def, node, qualified);
        Some(def)
    }

    fn use_selector(&mut self, node: Node<'a>, scope: ScopeId, stack: &mut Vec<UseStep<'a>>) {
        let field = node.child_by_field_name("field");

        match node.child_by_field_name("operand") {
            Some(operand) if operand.kind() == "identifier" => {
                let mut operand_is_package = false;
                if !is_struct_literal_key(operand) {
                    if let Some(def) = self.use_name(operand, scope, true) {
                        operand_is_package =
                            self.bindings.definition(def).kind == DefinitionKind::Import;
                    }
                }
                // Members of another package are outside this file.
                if !operand_is_package {
                    if let Some(field) = field {
                        self.use_member(field);
                    }
                }
            }
            Some(operand) => {
                if let Some(field) = field {
                    stack.push(UseStep::Field(field));
                }
                stack.push(UseStep::Visit(operand, scope));
            }
            None => {
                if let Some(field) = field {
                    self.use_member(field);
                }
            }
        }
    }

    /// Bind a selector field to the only member with its name, if any.
    fn use_member(&mut self, field: Node) {
        let unique = match self.members.get(self.text(field)) {
            Some(ids) if ids.len() == 1 => Some(ids[0]),
            _ => None,
        };
        if let Some(def) = unique {
            self.record(def, field, false);
        }
    }

    fn record(&mut self, definition: DefId, node: Node, qualified: bool) {
        self.bindings.uses.push(Use {
            definition,
            range: Range::from_node(node),
            qualified,
        });
    }
}

/// Pending work in the use pass.
enum UseStep<'t> {
    Visit(Node<'t>, ScopeId),
    /// Resolve a selector field once its operand has been walked.
    Field(Node<'t>),
}

/// Whether `node` is the key of a keyed element in a non-map composite
/// literal, i.e. a struct field name rather than an expression.
fn is_struct_literal_key(node: Node) -> bool {
    let Some(mut parent) = node.parent() else {
        return false;
    };
    let mut child = node;
    if parent.kind() == "literal_element" {
        child = parent;
        parent = match parent.parent() {
            Some(p) => p,
            None => return false,
        };
    }
    if parent.kind() != "keyed_element" {
        return false;
    }
    let is_key = parent
        .named_child(0)
        .map(|k| k.id() == child.id())
        .unwrap_or(false);
    if !is_key {
        return false;
    }

    let mut current = parent.parent();
    while let Some(n) = current {
        if n.kind() == "composite_literal" {
            return n
                .child_by_field_name("type")
                .map(|t| t.kind() != "map_type")
                .unwrap_or(true);
        }
        current = n.parent();
    }
    true
}

/// Strip the quotes of an interpreted or raw string literal.
pub(crate) fn unquote(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '`')
}

lazy_static::lazy_static! {
    static ref MAJOR_VERSION_RE: regex::Regex = regex::Regex::new(r"^v[0-9]+$").unwrap();
}

/// Package name an unaliased import binds, derived from its path.
///
/// Takes the last segment (the one before a `/vN` suffix), drops a leading
/// `go-` and cuts at the first character that cannot appear in an
/// identifier: `github.com/x/y/v2` -> `y`, `gopkg.in/yaml.v3` -> `yaml`,
/// `github.com/mattn/go-isatty` -> `isatty`, `github.com/x/go-bar-baz` -> `bar`.
pub fn default_package_name(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut last = segments.last().copied().unwrap_or(path);
    if segments.len() > 1 && MAJOR_VERSION_RE.is_match(last) {
        last = segments[segments.len() - 2];
    }
    let base = last.strip_prefix("go-").unwrap_or(last);
    let end = base
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(base.len());
    base[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parser::GoParser;

    fn bind(source: &str) -> Bindings {
        let parsed = GoParser::shared().unwrap().parse(source).unwrap();
        Bindings::build(&parsed)
    }

    fn defs_named<'a>(b: &'a Bindings, name: &'a str) -> Vec<(DefId, &'a Definition)> {
        b.definitions
            .iter()
            .enumerate()
            .filter(|(_, d)| d.name == name)
            .map(|(i, d)| (DefId(i), d))
            .collect()
    }

    #[test]
    fn test_default_package_name() {
        assert_eq!(default_package_name("fmt"), "fmt");
        assert_eq!(default_package_name("net/http"), "http");
        assert_eq!(default_package_name("github.com/go-chi/chi/v5"), "chi");
        assert_eq!(default_package_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(default_package_name("github.com/mattn/go-isatty"), "isatty");
        assert_eq!(default_package_name("github.com/x/go-bar-baz"), "bar");
        assert_eq!(default_package_name("github.com/x/kit.v2"), "kit");
    }

    #[test]
    fn test_uses_of_is_indexed_per_definition() {
        let mut source = String::from("package main\n\nvar total int\n");
        for i in 0..300 {
            source.push_str(&format!("\nfunc f{i}() int {{\n\ttotal++\n\treturn f{i}()\n}}\n"));
        }
        let b = bind(&source);

        for (i, _) in b.definitions.iter().enumerate() {
            let id = DefId(i);
            let indexed: Vec<&Use> = b.uses_of(id).collect();
            let scanned: Vec<&Use> = b.uses.iter().filter(|u| u.definition == id).collect();
            assert_eq!(indexed, scanned);
        }
        let (total, _) = defs_named(&b, "total")[0];
        assert_eq!(b.uses_of(total).count(), 300);
    }

    #[test]
    fn test_hyphenated_import_resolves_to_assumed_name() {
        let source = r#"package main

import "github.com/x/go-bar-baz"

func main() {
    bar.Do()
}
"#;
        let b = bind(source);
        let (id, def) = defs_named(&b, "bar")[0];
        assert_eq!(def.kind, DefinitionKind::Import);
        assert!(b.has_qualified_use(id));
    }

    #[test]
    fn test_shadowed_names_resolve_to_their_own_definition() {
        let source = r#"package main

var count = 1

func f() int {
    count := 2
    return count
}

func g() int {
    return count
}
"#;
        let b = bind(source);
        let defs = defs_named(&b, "count");
        assert_eq!(defs.len(), 2);

        let (package_def, _) = defs[0];
        let (local_def, local) = defs[1];
        assert_eq!(local.kind, DefinitionKind::Variable);
        assert_ne!(b.scope(local.scope).kind, ScopeKind::Package);

        assert_eq!(b.uses_of(local_def).count(), 1);
        let package_uses: Vec<_> = b.uses_of(package_def).collect();
        assert_eq!(package_uses.len(), 1);
        assert_eq!(package_uses[0].range.start.line, 10);
    }

    #[test]
    fn test_local_use_before_declaration_binds_outer() {
        let source = r#"package main

var x = 1

func f() int {
    y := x
    x := y
    return x
}
"#;
        let b = bind(source);
        let defs = defs_named(&b, "x");
        assert_eq!(defs.len(), 2);
        // `y := x` sees the package-level x.
        assert_eq!(b.uses_of(defs[0].0).count(), 1);
        // `return x` sees the local x.
        assert_eq!(b.uses_of(defs[1].0).count(), 1);
    }

    #[test]
    fn test_short_var_redeclaration_reuses_definition() {
        let source = r#"package main

func f() error {
    a, err := 1, error(nil)
    b, err := a, err
    _ = b
    return err
}
"#;
        let b = bind(source);
        assert_eq!(defs_named(&b, "err").len(), 1);
    }

    #[test]
    fn test_import_qualified_use() {
        let source = r#"package main

import (
    "fmt"
    str "strings"
    "os"
)

func main() {
    fmt.Println(str.ToUpper("x"))
}
"#;
        let b = bind(source);
        let fmt = defs_named(&b, "fmt")[0].0;
        let strs = defs_named(&b, "str")[0].0;
        let os = defs_named(&b, "os")[0].0;
        assert!(b.has_qualified_use(fmt));
        assert!(b.has_qualified_use(strs));
        assert!(!b.has_qualified_use(os));
    }

    #[test]
    fn test_local_shadowing_package_import_is_not_qualified_use() {
        let source = r#"package main

import "strings"

type T struct{ Len int }

func f() int {
    strings := T{Len: 3}
    return strings.Len
}
"#;
        let b = bind(source);
        let import = defs_named(&b, "strings")
            .into_iter()
            .find(|(_, d)| d.kind == DefinitionKind::Import)
            .unwrap()
            .0;
        assert!(!b.has_qualified_use(import));
    }

    #[test]
    fn test_labels_and_members() {
        let source = r#"package main

type Config struct {
    Name string
}

func (c *Config) Validate() bool {
    return c.Name != ""
}

func loop(cfgs []Config) {
outer:
    for _, c := range cfgs {
        if c.Validate() {
            continue outer
        }
    }
}
"#;
        let b = bind(source);
        let (label, label_def) = defs_named(&b, "outer")[0];
        assert_eq!(label_def.kind, DefinitionKind::Label);
        assert_eq!(b.uses_of(label).count(), 1);

        let (field, _) = defs_named(&b, "Name")[0];
        assert_eq!(b.uses_of(field).count(), 1);

        let (method, _) = defs_named(&b, "Validate")[0];
        assert_eq!(b.uses_of(method).count(), 1);

        let (config, _) = defs_named(&b, "Config")[0];
        // receiver type and []Config parameter type
        assert_eq!(b.uses_of(config).count(), 2);
    }

    #[test]
    fn test_struct_literal_keys_are_not_uses() {
        let source = r#"package main

var Name = "x"

type T struct{ Name string }

var t = T{Name: Name}
"#;
        let b = bind(source);
        let var = defs_named(&b, "Name")
            .into_iter()
            .find(|(_, d)| d.kind == DefinitionKind::Variable)
            .unwrap()
            .0;
        // only the value side of the keyed element
        assert_eq!(b.uses_of(var).count(), 1);
    }

    #[test]
    fn test_function_type_parameters_do_not_leak() {
        let source = r#"package main

var handler func(count int) error

func f() {
    count := 1
    _ = count
}
"#;
        let b = bind(source);
        let defs = defs_named(&b, "count");
        assert_eq!(defs.len(), 2);
        assert_eq!(b.scope(defs[0].1.scope).kind, ScopeKind::Signature);
        assert_eq!(b.uses_of(defs[1].0).count(), 1);
    }
}
