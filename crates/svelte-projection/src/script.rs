//! Script block passthrough.
//!
//! Script content stays at module level of the projection. The only rewrites
//! are dropping `export` from instance-script declarations (they become props)
//! and turning `$:` statements into plain TypeScript.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::{BufferError, ByteOffset, MappedBuffer, Span};
use swc_common::{BytePos, FileName, SourceMap, Spanned};
use swc_ecma_ast::{
    AssignOp, AssignTarget, Decl, Expr, ImportSpecifier, LabeledStmt, Module, ModuleDecl,
    ModuleItem, Pat, SimpleAssignTarget, Stmt, VarDeclKind,
};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use text_size::TextSize;
use tracing::debug;

use crate::markup::ScriptBlock;

/// What a top-level name in a script is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// `export let` in the instance script.
    Prop,
    /// Implicitly declared by `$: name = …`.
    Reactive,
    Variable,
    Function,
    Class,
}

/// A top-level declaration and where it ended up in the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: SmolStr,
    pub kind: DeclarationKind,
    /// The identifier in the original text.
    pub original: Span,
    /// The identifier in the projected text, once known.
    pub generated: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScriptRole {
    Instance,
    Module,
}

/// Rewrites one script block's content in place and returns its declarations.
///
/// `known` holds the top-level names of blocks projected earlier, since all
/// blocks share one module scope in the projection. It is extended with this
/// block's names. Content that does not parse is passed through untouched.
pub(crate) fn project_script<'src>(
    buffer: &mut MappedBuffer<'src>,
    source: &'src str,
    block: &ScriptBlock,
    role: ScriptRole,
    known: &mut FxHashSet<SmolStr>,
) -> Result<Vec<Declaration>, BufferError> {
    let content = block.content_span.slice(source).unwrap_or_default();
    let Some((module, start_pos)) = parse_module(content, block.is_typescript()) else {
        debug!(
            start = u32::from(block.content_span.start),
            "script does not parse, passing it through"
        );
        return Ok(Vec::new());
    };

    let mut rewriter = ScriptRewriter {
        buffer,
        source,
        base: u32::from(block.content_span.start),
        start_pos,
        declared: top_level_names(&module)
            .into_iter()
            .chain(known.iter().cloned())
            .collect(),
        declarations: Vec::new(),
    };
    for item in &module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                let exported = rewriter.declaration(&export.decl, role);
                if role == ScriptRole::Instance && exported {
                    rewriter.remove_export_keyword(export.span.lo)?;
                }
            }
            ModuleItem::Stmt(Stmt::Decl(decl)) => {
                rewriter.declaration(decl, ScriptRole::Module);
            }
            ModuleItem::Stmt(Stmt::Labeled(labeled))
                if role == ScriptRole::Instance && labeled.label.sym.as_ref() == "$" =>
            {
                rewriter.reactive(labeled)?;
            }
            _ => {}
        }
    }
    known.extend(rewriter.declared);
    Ok(rewriter.declarations)
}

fn parse_module(script: &str, typescript: bool) -> Option<(Module, BytePos)> {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom("svelte-script".into()).into(),
        script.to_string(),
    );
    let syntax = if typescript {
        Syntax::Typescript(TsSyntax {
            tsx: false,
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax::default())
    };
    let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
    let module = parser.parse_module().ok()?;
    Some((module, fm.start_pos))
}

/// Names bound at the top level, used to tell `$: x = …` declarations from assignments.
fn top_level_names(module: &Module) -> FxHashSet<SmolStr> {
    let mut names = FxHashSet::default();
    for item in &module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                for specifier in &import.specifiers {
                    let local = match specifier {
                        ImportSpecifier::Named(named) => &named.local,
                        ImportSpecifier::Default(default) => &default.local,
                        ImportSpecifier::Namespace(namespace) => &namespace.local,
                    };
                    names.insert(SmolStr::new(local.sym.as_ref()));
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                names.extend(decl_names(&export.decl).map(|(name, _)| name));
            }
            ModuleItem::Stmt(Stmt::Decl(decl)) => {
                names.extend(decl_names(decl).map(|(name, _)| name));
            }
            _ => {}
        }
    }
    names
}

/// Yields the simple identifiers a declaration binds, with their spans.
fn decl_names(decl: &Decl) -> impl Iterator<Item = (SmolStr, swc_common::Span)> + '_ {
    let (single, vars) = match decl {
        Decl::Fn(func) => (Some(&func.ident), None),
        Decl::Class(class) => (Some(&class.ident), None),
        Decl::Var(var) => (None, Some(var)),
        _ => (None, None),
    };
    let single = single.map(|ident| (SmolStr::new(ident.sym.as_ref()), ident.span));
    let vars = vars
        .into_iter()
        .flat_map(|var| var.decls.iter())
        .filter_map(|declarator| match &declarator.name {
            // Destructuring patterns are not tracked.
            Pat::Ident(binding) => Some((SmolStr::new(binding.id.sym.as_ref()), binding.id.span)),
            _ => None,
        });
    single.into_iter().chain(vars)
}

struct ScriptRewriter<'b, 'src> {
    buffer: &'b mut MappedBuffer<'src>,
    source: &'src str,
    base: u32,
    start_pos: BytePos,
    declared: FxHashSet<SmolStr>,
    declarations: Vec<Declaration>,
}

impl ScriptRewriter<'_, '_> {
    fn offset(&self, pos: BytePos) -> ByteOffset {
        TextSize::from(self.base + (pos.0 - self.start_pos.0))
    }

    fn span(&self, span: swc_common::Span) -> Span {
        Span::new(self.offset(span.lo), self.offset(span.hi))
    }

    /// The span of an identifier, excluding any type annotation.
    fn ident_span(&self, name: &str, lo: BytePos) -> Span {
        let start = self.offset(lo);
        Span::new(start, start + TextSize::from(name.len() as u32))
    }

    /// Records the names a declaration binds. Returns true if it is a value
    /// declaration whose `export` should be dropped.
    fn declaration(&mut self, decl: &Decl, role: ScriptRole) -> bool {
        let kind = match decl {
            Decl::Fn(_) => DeclarationKind::Function,
            Decl::Class(_) => DeclarationKind::Class,
            Decl::Var(var) if var.declare => return false,
            Decl::Var(var) if role == ScriptRole::Instance && var.kind != VarDeclKind::Const => {
                DeclarationKind::Prop
            }
            Decl::Var(_) => DeclarationKind::Variable,
            _ => return false,
        };
        let found: Vec<_> = decl_names(decl).collect();
        for (name, span) in found {
            let original = self.ident_span(&name, span.lo);
            self.declarations.push(Declaration {
                name,
                kind,
                original,
                generated: None,
            });
        }
        true
    }

    /// Removes `export` and the whitespace after it.
    fn remove_export_keyword(&mut self, export_start: BytePos) -> Result<(), BufferError> {
        let start = usize::from(self.offset(export_start));
        let keyword_end = start + "export".len();
        let rest = &self.source[keyword_end..];
        let end = keyword_end + (rest.len() - rest.trim_start().len());
        self.buffer.remove(start as u32, end as u32)
    }

    /// `$: x = expr` declares `x` when nothing else does; any other `$:`
    /// statement becomes a function body so its references are still checked.
    fn reactive(&mut self, labeled: &LabeledStmt) -> Result<(), BufferError> {
        let label_start = self.offset(labeled.span.lo);

        if let Stmt::Expr(stmt) = &*labeled.body {
            if let Expr::Assign(assign) = &*stmt.expr {
                if let (AssignOp::Assign, AssignTarget::Simple(SimpleAssignTarget::Ident(target))) =
                    (assign.op, &assign.left)
                {
                    let name = SmolStr::new(target.id.sym.as_ref());
                    if !self.declared.contains(&name) {
                        let ident = self.ident_span(&name, target.id.span.lo);
                        let right = self.span(assign.right.span());
                        self.buffer.overwrite(label_start, ident.start, "let ")?;
                        self.buffer.overwrite(
                            ident.end,
                            right.start,
                            " = __sveltets_1_invalidate(() => (",
                        )?;
                        self.buffer.insert_after(right.end, "))")?;
                        self.declared.insert(name.clone());
                        self.declarations.push(Declaration {
                            name,
                            kind: DeclarationKind::Reactive,
                            original: ident,
                            generated: None,
                        });
                        return Ok(());
                    }
                }
            }
        }

        let body = self.span(labeled.body.span());
        self.buffer.overwrite(label_start, body.start, ";() => {")?;
        self.buffer.insert_after(body.end, "}")
    }
}
