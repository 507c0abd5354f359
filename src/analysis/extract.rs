//! Symbol extraction for Go.
//!
//! Extracts, in source order:
//! - The package name
//! - Imports (with alias and usage)
//! - Function and method declarations with signatures and complexity
//! - Type declarations (struct, interface, everything else)
//! - Variable and constant declarations, package-level and local

use tree_sitter::Node;

use super::metrics::function_complexity;
use super::parser::{GoParser, ParsedFile};
use super::scope::{unquote, Bindings};
use super::{
    FieldInfo, FunctionInfo, ImportInfo, MethodInfo, ParameterInfo, Range, TypeDetail, TypeInfo,
    VariableInfo, VariableScope,
};

/// Declarations found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFacts {
    pub package: Option<String>,
    pub imports: Vec<ImportInfo>,
    pub functions: Vec<FunctionInfo>,
    pub types: Vec<TypeInfo>,
    pub variables: Vec<VariableInfo>,
}

/// Walk the tree once and collect every declaration.
pub fn extract(parser: &GoParser, parsed: &ParsedFile, bindings: &Bindings) -> ExtractedFacts {
    let mut extractor = Extractor {
        parser,
        parsed,
        bindings,
        facts: ExtractedFacts::default(),
    };
    extractor.walk(parsed.root());
    extractor.facts
}

struct Extractor<'a> {
    parser: &'a GoParser,
    parsed: &'a ParsedFile,
    bindings: &'a Bindings,
    facts: ExtractedFacts,
}

impl<'a> Extractor<'a> {
    fn text(&self, node: Node) -> &'a str {
        self.parsed.node_text(node)
    }

    /// Pre-order walk over named nodes, using an explicit stack.
    fn walk(&mut self, root: Node) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !self.visit(node) {
                continue;
            }
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    /// Collect what `node` declares; returns whether to descend into it.
    fn visit(&mut self, node: Node) -> bool {
        match node.kind() {
            "package_clause" => {
                let mut cursor = node.walk();
                let name = node
                    .named_children(&mut cursor)
                    .find(|n| n.kind() == "package_identifier")
                    .map(|n| self.text(n).to_string());
                self.facts.package = name;
                return false;
            }
            "import_spec" => {
                let import = self.import(node);
                self.facts.imports.extend(import);
                return false;
            }
            "function_declaration" | "method_declaration" => {
                let function = self.function(node);
                self.facts.functions.extend(function);
            }
            "type_spec" | "type_alias" => {
                let info = self.type_info(node);
                self.facts.types.extend(info);
            }
            "var_spec" | "const_spec" => {
                let vars = self.variables(node);
                self.facts.variables.extend(vars);
            }
            _ => {}
        }
        true
    }

    fn import(&self, spec: Node) -> Option<ImportInfo> {
        let path = unquote(self.text(spec.child_by_field_name("path")?)).to_string();
        let name = spec.child_by_field_name("name");

        let used = match name.map(|n| n.kind()) {
            Some("blank_identifier") | Some("dot") => true,
            _ => self
                .bindings
                .import_binding(spec.start_byte())
                .map(|id| self.bindings.has_qualified_use(id))
                .unwrap_or(false),
        };

        Some(ImportInfo {
            path,
            alias: name.map(|n| self.text(n).to_string()),
            used,
            range: Range::from_node(spec),
        })
    }

    fn function(&self, node: Node) -> Option<FunctionInfo> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.text(name_node).to_string();
        let is_method = node.kind() == "method_declaration";

        let receiver = if is_method {
            node.child_by_field_name("receiver")
                .and_then(|list| {
                    let mut cursor = list.walk();
                    let decl = list
                        .named_children(&mut cursor)
                        .find(|n| n.kind() == "parameter_declaration");
                    decl
                })
                .and_then(|decl| decl.child_by_field_name("type"))
                .map(|ty| self.type_string(ty))
        } else {
            None
        };

        let parameters = node
            .child_by_field_name("parameters")
            .map(|p| self.parameters(p))
            .unwrap_or_default();
        let returns = self.results(node.child_by_field_name("result"));
        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|tp| collapse_whitespace(self.text(tp)))
            .unwrap_or_default();

        let mut signature = String::from("func ");
        if let Some(recv) = &receiver {
            signature.push_str(&format!("({}) ", recv));
        }
        signature.push_str(&name);
        signature.push_str(&type_params);
        signature.push_str(&render_params_and_results(&parameters, &returns));

        Some(FunctionInfo {
            exported: is_exported(&name),
            documentation: self.documentation(node),
            range: Range::from_node(node),
            name_range: Range::from_node(name_node),
            complexity: function_complexity(self.parser, self.parsed, node),
            is_method,
            receiver,
            signature,
            parameters,
            returns,
            name,
        })
    }

    /// Parameters of a `parameter_list`, one entry per declared name.
    fn parameters(&self, list: Node) -> Vec<ParameterInfo> {
        let mut params = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            let variadic = match decl.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let type_name = decl
                .child_by_field_name("type")
                .map(|t| self.type_string(t))
                .unwrap_or_default();

            let mut name_cursor = decl.walk();
            let names: Vec<Node> = decl.children_by_field_name("name", &mut name_cursor).collect();
            if names.is_empty() {
                params.push(ParameterInfo {
                    name: None,
                    type_name,
                    variadic,
                });
            } else {
                for n in names {
                    params.push(ParameterInfo {
                        name: Some(self.text(n).to_string()),
                        type_name: type_name.clone(),
                        variadic,
                    });
                }
            }
        }
        params
    }

    /// Results are either a parameter list or a single bare type.
    fn results(&self, result: Option<Node>) -> Vec<ParameterInfo> {
        match result {
            None => Vec::new(),
            Some(list) if list.kind() == "parameter_list" => self.parameters(list),
            Some(ty) => vec![ParameterInfo {
                name: None,
                type_name: self.type_string(ty),
                variadic: false,
            }],
        }
    }

    fn type_info(&self, spec: Node) -> Option<TypeInfo> {
        let name = self.text(spec.child_by_field_name("name")?).to_string();
        let body = spec.child_by_field_name("type")?;

        let alias = spec.kind() == "type_alias";
        let detail = match body.kind() {
            "struct_type" => TypeDetail::Struct {
                fields: self.fields(body),
                alias,
            },
            "interface_type" => {
                let (methods, embedded) = self.interface_members(body);
                TypeDetail::Interface {
                    methods,
                    embedded,
                    alias,
                }
            }
            _ => TypeDetail::Other {
                underlying: self.type_string(body),
                alias,
            },
        };

        Some(TypeInfo {
            name,
            documentation: self.documentation(spec),
            range: Range::from_node(spec),
            detail,
        })
    }

    fn fields(&self, body: Node) -> Vec<FieldInfo> {
        let mut fields = Vec::new();
        for list in named_children_of_kind(body, "field_declaration_list") {
            for decl in named_children_of_kind(list, "field_declaration") {
                let Some(ty) = decl.child_by_field_name("type") else {
                    continue;
                };
                let mut type_name = self.type_string(ty);
                let tag = decl
                    .child_by_field_name("tag")
                    .map(|t| self.text(t).to_string());
                let documentation = self.documentation(decl);

                let mut cursor = decl.walk();
                let names: Vec<Node> = decl.children_by_field_name("name", &mut cursor).collect();
                if names.is_empty() {
                    // `*T` embeds keep the star outside the type node.
                    if decl.child(0).is_some_and(|c| c.kind() == "*") {
                        type_name = format!("*{}", type_name);
                    }
                    fields.push(FieldInfo {
                        name: embedded_name(&type_name),
                        type_name,
                        documentation,
                        tag,
                        embedded: true,
                    });
                    continue;
                }
                for n in names {
                    fields.push(FieldInfo {
                        name: self.text(n).to_string(),
                        type_name: type_name.clone(),
                        documentation: documentation.clone(),
                        tag: tag.clone(),
                        embedded: false,
                    });
                }
            }
        }
        fields
    }

    fn interface_members(&self, body: Node) -> (Vec<MethodInfo>, Vec<String>) {
        let mut methods = Vec::new();
        let mut embedded = Vec::new();

        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "comment" => {}
                "method_elem" | "method_spec" => {
                    let Some(name_node) = member.child_by_field_name("name") else {
                        continue;
                    };
                    let name = self.text(name_node).to_string();
                    let parameters = member
                        .child_by_field_name("parameters")
                        .map(|p| self.parameters(p))
                        .unwrap_or_default();
                    let returns = self.results(member.child_by_field_name("result"));
                    let signature = format!(
                        "func {}{}",
                        name,
                        render_params_and_results(&parameters, &returns)
                    );
                    methods.push(MethodInfo {
                        documentation: self.documentation(member),
                        name,
                        signature,
                        parameters,
                        returns,
                    });
                }
                _ => embedded.push(self.type_string(member)),
            }
        }
        (methods, embedded)
    }

    fn variables(&self, spec: Node) -> Vec<VariableInfo> {
        let constant = spec.kind() == "const_spec";
        let type_name = spec
            .child_by_field_name("type")
            .map(|t| self.type_string(t));
        let values: Vec<String> = spec
            .child_by_field_name("value")
            .map(|list| {
                let mut cursor = list.walk();
                let values: Vec<String> = list
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() != "comment")
                    .map(|n| collapse_whitespace(self.text(n)))
                    .collect();
                values
            })
            .unwrap_or_default();
        let scope = match declaration_of(spec).and_then(|d| d.parent()).map(|p| p.kind()) {
            Some("source_file") => VariableScope::Package,
            _ => VariableScope::Local,
        };
        let documentation = self.documentation(spec);

        let mut cursor = spec.walk();
        let names: Vec<Node> = spec.children_by_field_name("name", &mut cursor).collect();
        names
            .into_iter()
            .enumerate()
            .filter(|(_, n)| self.text(*n) != "_")
            .map(|(i, n)| VariableInfo {
                name: self.text(n).to_string(),
                type_name: type_name.clone(),
                range: Range::from_node(n),
                constant,
                value: values.get(i).cloned(),
                documentation: documentation.clone(),
                scope,
            })
            .collect()
    }

    /// Normalized text of a type node; non-empty struct and interface
    /// bodies collapse to `struct{...}` / `interface{...}`.
    fn type_string(&self, node: Node) -> String {
        match node.kind() {
            "struct_type" => {
                let has_fields = named_children_of_kind(node, "field_declaration_list")
                    .into_iter()
                    .any(|l| !named_children_of_kind(l, "field_declaration").is_empty());
                if has_fields { "struct{...}" } else { "struct{}" }.to_string()
            }
            "interface_type" => {
                let mut cursor = node.walk();
                let has_members = node
                    .named_children(&mut cursor)
                    .any(|n| n.kind() != "comment");
                if has_members { "interface{...}" } else { "interface{}" }.to_string()
            }
            _ => collapse_whitespace(self.text(node)),
        }
    }

    /// Comment group immediately above the declaration.
    fn documentation(&self, node: Node) -> Option<String> {
        let target = doc_target(node);

        let mut group = Vec::new();
        let mut next_row = target.start_position().row;
        let mut current = target.prev_sibling();
        while let Some(prev) = current {
            if prev.kind() != "comment" || prev.end_position().row + 1 != next_row {
                break;
            }
            // A trailing comment on the previous declaration's line is not ours.
            if let Some(before) = prev.prev_sibling() {
                if before.is_named()
                    && before.kind() != "comment"
                    && before.end_position().row == prev.start_position().row
                {
                    break;
                }
            }
            group.push(prev);
            next_row = prev.start_position().row;
            current = prev.prev_sibling();
        }
        if group.is_empty() {
            return None;
        }

        group.reverse();
        let lines: Vec<String> = group
            .into_iter()
            .flat_map(|c| comment_lines(self.text(c)))
            .collect();
        let text = lines.join("\n").trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// The node whose preceding comments document `node`: an ungrouped
/// `type`/`var`/`const` declaration documents its single spec.
fn doc_target(node: Node) -> Node {
    match declaration_of(node) {
        Some(decl) if !has_paren(decl) => decl,
        _ => node,
    }
}

/// Enclosing `*_declaration` of a spec (possibly through a spec list).
fn declaration_of(spec: Node) -> Option<Node> {
    if !matches!(spec.kind(), "type_spec" | "type_alias" | "var_spec" | "const_spec") {
        return None;
    }
    let mut parent = spec.parent()?;
    if parent.kind().ends_with("_spec_list") {
        parent = parent.parent()?;
    }
    matches!(
        parent.kind(),
        "type_declaration" | "var_declaration" | "const_declaration"
    )
    .then_some(parent)
}

fn has_paren(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == "(");
    found
}

fn named_children_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .filter(|n| n.kind() == kind)
        .collect();
    found
}

/// Strip comment markers, dropping compiler directives.
fn comment_lines(raw: &str) -> Vec<String> {
    if let Some(line) = raw.strip_prefix("//") {
        if line.starts_with("go:") || line.starts_with("line ") {
            return Vec::new();
        }
        return vec![line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()];
    }

    let body = raw
        .strip_prefix("/*")
        .and_then(|b| b.strip_suffix("*/"))
        .unwrap_or(raw);
    let mut lines: Vec<String> = body
        .lines()
        .map(|l| {
            let l = l.trim();
            let l = l.strip_prefix('*').unwrap_or(l);
            l.strip_prefix(' ').unwrap_or(l).trim_end().to_string()
        })
        .collect();
    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn render_params_and_results(params: &[ParameterInfo], returns: &[ParameterInfo]) -> String {
    let rendered: Vec<String> = params.iter().map(ParameterInfo::render).collect();
    let mut out = format!("({})", rendered.join(", "));
    match returns {
        [] => {}
        [single] if single.name.is_none() => {
            out.push(' ');
            out.push_str(&single.render());
        }
        many => {
            let rendered: Vec<String> = many.iter().map(ParameterInfo::render).collect();
            out.push_str(&format!(" ({})", rendered.join(", ")));
        }
    }
    out
}

/// Field name of an embedded type: `*pkg.Base[T]` -> `Base`.
fn embedded_name(type_name: &str) -> String {
    let base = type_name.trim_start_matches('*');
    let base = base.split('[').next().unwrap_or(base);
    base.rsplit('.').next().unwrap_or(base).to_string()
}

/// Go exports identifiers that start with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
