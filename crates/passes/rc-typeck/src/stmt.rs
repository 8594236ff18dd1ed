//! Statement checks

use crate::TypeResolver;
use rc_diagnostics::ErrorKind;
use rc_tree::{Expr, NodeId, NodeKind, Stmt};

impl TypeResolver<'_> {
    pub(crate) fn check_stmt(&mut self, id: NodeId, stmt: Stmt) {
        match stmt {
            Stmt::Block { stmts } => self.check_all(&stmts),
            Stmt::Return { value } => self.check_return(id, value),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond);
                self.check(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check(else_branch);
                }
            }
            Stmt::While { cond, body } => {
                self.check_condition(cond);
                self.check(body);
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.check(init);
                }
                if let Some(cond) = cond {
                    self.check_condition(cond);
                }
                if let Some(step) = step {
                    self.check(step);
                }
                self.check(body);
            }
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                ..
            } => self.check_switch(id, scrutinee, &cases, default),
            Stmt::Case { values, body, .. } => {
                self.check_all(&values);
                if let Some(&first) = values.first() {
                    self.ctx.tree[id].ty = self.ctx.tree.ty(first);
                }
                self.check(body);
            }
            Stmt::Default { body, .. } => self.check(body),
            Stmt::Delete { targets } => {
                for target in targets {
                    let named = matches!(
                        self.ctx.tree[target].kind,
                        NodeKind::Expr(Expr::Identifier { .. } | Expr::MemberAccess { .. })
                    );
                    if !named {
                        self.ctx.error(target, ErrorKind::InvalidExpression);
                        continue;
                    }
                    self.check(target);
                }
            }
            Stmt::Label => {
                let name = self.ctx.tree[id].token.name;
                let repeated = self
                    .labels(id)
                    .into_iter()
                    .take_while(|&label| label != id)
                    .any(|label| self.ctx.tree[label].token.name == name);
                if repeated {
                    self.ctx.error(id, ErrorKind::NameAlreadyExists);
                }
            }
            Stmt::Goto => {
                let name = self.ctx.tree[id].token.name;
                let found = self
                    .labels(id)
                    .into_iter()
                    .any(|label| self.ctx.tree[label].token.name == name);
                if !found {
                    self.ctx.error(id, ErrorKind::UnknownName);
                }
            }
            Stmt::Break | Stmt::Continue => {}
        }
    }

    /// Labels of the function enclosing `id`, in source order
    fn labels(&self, id: NodeId) -> Vec<NodeId> {
        let tree = &self.ctx.tree;
        tree.enclosing_function(id)
            .map(|func| {
                tree.descendants(func)
                    .into_iter()
                    .filter(|&node| matches!(tree[node].kind, NodeKind::Stmt(Stmt::Label)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A condition must be of type `bool`
    fn check_condition(&mut self, cond: NodeId) {
        self.check(cond);
        match self.ctx.tree.ty(cond) {
            Some(ty) if !self.is_bool(ty) => self.ctx.error(cond, ErrorKind::InvalidExpression),
            _ => {}
        }
    }

    fn check_return(&mut self, id: NodeId, value: Option<NodeId>) {
        let Some(value) = value else {
            return;
        };
        self.check(value);
        let expected = self
            .ctx
            .tree
            .enclosing_function(id)
            .and_then(|func| self.ctx.tree.ty(func));
        if let (Some(found), Some(expected)) = (self.ctx.tree.ty(value), expected) {
            if !self.compatible(expected, found) {
                self.ctx.error(value, ErrorKind::IncompatibleType);
            }
        }
    }

    /// Type the switch by its first case and record on the switch and every
    /// arm whether each case value has that same type
    fn check_switch(
        &mut self,
        id: NodeId,
        scrutinee: NodeId,
        cases: &[NodeId],
        default: Option<NodeId>,
    ) {
        self.check(scrutinee);
        let expected = self.ctx.tree.ty(scrutinee);
        let mut switch_ty = None;
        let mut same_type = true;

        for &case in cases {
            self.check(case);
            let values = match &self.ctx.tree[case].kind {
                NodeKind::Stmt(Stmt::Case { values, .. }) => values.clone(),
                _ => continue,
            };
            for value in values {
                let Some(found) = self.ctx.tree.ty(value) else {
                    continue;
                };
                if let Some(expected) = expected {
                    if !self.compatible(expected, found) {
                        self.ctx.error(value, ErrorKind::IncompatibleType);
                        continue;
                    }
                }
                match switch_ty {
                    None => switch_ty = Some(found),
                    Some(first) if first != found => same_type = false,
                    Some(_) => {}
                }
            }
        }
        if let Some(default) = default {
            self.check(default);
        }

        self.ctx.tree[id].ty = switch_ty;
        if let NodeKind::Stmt(Stmt::Switch { same_type: slot, .. }) = &mut self.ctx.tree[id].kind {
            *slot = same_type;
        }
        for arm in cases.iter().copied().chain(default) {
            if let NodeKind::Stmt(
                Stmt::Case { same_type: slot, .. } | Stmt::Default { same_type: slot, .. },
            ) = &mut self.ctx.tree[arm].kind
            {
                *slot = same_type;
            }
        }
    }
}
