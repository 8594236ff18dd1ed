//! Expression checks

use crate::TypeResolver;
use rc_diagnostics::ErrorKind;
use rc_tree::{BinaryOp, Decl, Expr, FunctionKind, LiteralKind, NodeId, NodeKind, Ty, UnaryOp};

impl TypeResolver<'_> {
    pub(crate) fn check_expr(&mut self, id: NodeId, expr: Expr) {
        match expr {
            Expr::Literal(kind) => self.check_literal(id, kind),
            Expr::Identifier { from, .. } => self.resolve_identifier(id, from),
            Expr::MemberAccess { object, member } => {
                self.check(object);
                if self.ctx.tree.ty(object).is_none() {
                    return;
                }
                self.check(member);
                self.ctx.tree[id].ty = self.ctx.tree.ty(member);
            }
            Expr::Call { args, .. } => self.check_call(id, &args),
            Expr::Binary { op, lhs, rhs, .. } => self.check_binary(id, op, lhs, rhs),
            Expr::Unary { op, operand } => {
                self.check(operand);
                let Some(ty) = self.ctx.tree.ty(operand) else {
                    return;
                };
                let valid = match op {
                    UnaryOp::Not => self.is_bool(ty),
                    UnaryOp::Neg | UnaryOp::BitNot | UnaryOp::Inc | UnaryOp::Dec => {
                        self.is_number(ty)
                    }
                };
                if valid {
                    self.ctx.tree[id].ty = Some(ty);
                } else {
                    self.ctx.error(id, ErrorKind::InvalidExpression);
                }
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => self.check_ternary(id, cond, then_expr, else_expr),
            Expr::Cast { target, expr } => {
                self.check(expr);
                match self.type_named(target) {
                    Some(ty) => self.ctx.tree[id].ty = Some(ty),
                    None => self.ctx.error_at(target, ErrorKind::UndefinedType),
                }
            }
            Expr::As { target, expr } => {
                self.check(expr);
                match self.type_named(target) {
                    Some(ty) => self.ctx.tree[id].ty = Some(ty),
                    None => self.ctx.error_at(target, ErrorKind::UnknownType),
                }
            }
            Expr::Base => {
                let base = self
                    .ctx
                    .tree
                    .enclosing_class(id)
                    .and_then(|class| self.ctx.tree.class(class)?.base);
                match base {
                    Some(base) => self.ctx.tree[id].ty = Some(Ty::Class(base)),
                    None => self.ctx.error(id, ErrorKind::InvalidExpression),
                }
            }
            Expr::New { call } => {
                let name = self.ctx.tree[id].token.name;
                let Some(class) = self.registry.find(name) else {
                    self.ctx.error(id, ErrorKind::UnknownType);
                    return;
                };
                self.ctx.tree[id].ty = Some(Ty::Class(class));
                self.check(call);
            }
            Expr::SizeOf { target } => {
                if self.type_named(target).is_none() {
                    self.ctx.error_at(target, ErrorKind::UnknownType);
                    return;
                }
                self.set_builtin(id, self.registry.builtins.i32);
            }
            Expr::TypeOf { expr } | Expr::Paren { expr } => {
                self.check(expr);
                self.ctx.tree[id].ty = self.ctx.tree.ty(expr);
            }
            Expr::Ref { expr } => {
                self.check(expr);
                self.set_builtin(id, self.registry.builtins.pointer);
            }
            Expr::Index { target, index, .. } => self.check_index(id, target, index),
            Expr::TypeName => {
                let token = self.ctx.tree[id].token;
                match self.type_named(token) {
                    Some(ty) => self.ctx.tree[id].ty = Some(ty),
                    None => self.ctx.error(id, ErrorKind::UnknownType),
                }
            }
        }
    }

    fn check_literal(&mut self, id: NodeId, kind: LiteralKind) {
        let builtins = self.registry.builtins;
        let class = match kind {
            LiteralKind::Int | LiteralKind::Hex => builtins.i32,
            LiteralKind::Real => builtins.f64,
            LiteralKind::Float => builtins.f32,
            LiteralKind::Str => builtins.string,
            LiteralKind::Char => builtins.byte,
            LiteralKind::Bool => builtins.boolean,
            LiteralKind::Null => {
                self.ctx.tree[id].ty = Some(Ty::Null);
                self.ctx.tree[id].real = "NULL".to_string();
                return;
            }
        };
        self.set_builtin(id, class);
    }

    /// Type a binary expression
    ///
    /// When the right operand's class declares an operator for the token,
    /// the binary takes that operator's type and records it for lowering.
    /// Otherwise both operands must be compatible: comparisons and logical
    /// operators yield `bool`, assignments the left type and arithmetic the
    /// right type.
    fn check_binary(&mut self, id: NodeId, op: BinaryOp, lhs: NodeId, rhs: NodeId) {
        self.check(lhs);
        self.check(rhs);
        let (Some(left), Some(right)) = (self.ctx.tree.ty(lhs), self.ctx.tree.ty(rhs)) else {
            return;
        };

        if let Some(operator) = right.class().and_then(|class| self.find_operator(class, op)) {
            let params = self
                .ctx
                .tree
                .function(operator)
                .map(|func| func.params.clone())
                .unwrap_or_default();
            let &[param] = params.as_slice() else {
                self.ctx
                    .error(id, ErrorKind::OnlyOneParameterAllowedInOperator);
                return;
            };
            if let Some(expected) = self.ctx.tree.ty(param) {
                if !self.compatible(expected, right) {
                    self.ctx.error(id, ErrorKind::IncompatibleType);
                    return;
                }
            }
            tracing::trace!(op = op.symbol(), ?operator, "operator overload");
            self.ctx.tree[id].ty = self.ctx.tree.ty(operator);
            if let NodeKind::Expr(Expr::Binary { overload, .. }) = &mut self.ctx.tree[id].kind {
                *overload = Some(operator);
            }
            return;
        }

        if !self.compatible(left, right) {
            self.ctx.error(rhs, ErrorKind::IncompatibleType);
            return;
        }
        let ty = if op.is_boolean() {
            match self.registry.builtins.boolean {
                Some(boolean) => Ty::Class(boolean),
                None => {
                    self.ctx.error(id, ErrorKind::UnknownType);
                    return;
                }
            }
        } else if op == BinaryOp::Assign {
            left
        } else {
            right
        };
        self.ctx.tree[id].ty = Some(ty);
    }

    /// Operator for `op` declared directly on `class`
    fn find_operator(&self, class: NodeId, op: BinaryOp) -> Option<NodeId> {
        let tree = &self.ctx.tree;
        tree.class(class)?.members.iter().copied().find(|&member| {
            tree.function(member)
                .is_some_and(|func| func.kind == FunctionKind::Operator(op))
        })
    }

    fn check_ternary(&mut self, id: NodeId, cond: NodeId, then_expr: NodeId, else_expr: NodeId) {
        self.check(cond);
        let Some(cond_ty) = self.ctx.tree.ty(cond) else {
            return;
        };
        if !self.is_bool(cond_ty) {
            self.ctx.error(id, ErrorKind::InvalidExpression);
            return;
        }
        self.check(then_expr);
        self.check(else_expr);
        let (Some(then_ty), Some(else_ty)) =
            (self.ctx.tree.ty(then_expr), self.ctx.tree.ty(else_expr))
        else {
            return;
        };
        if !self.compatible(then_ty, else_ty) {
            self.ctx.error(id, ErrorKind::IncompatibleType);
            return;
        }
        self.ctx.tree[id].ty = Some(then_ty);
    }

    /// Bind an indexer of the target's class, else take the element type of
    /// an array class
    ///
    /// Reading through an indexer needs its getter, assigning needs its
    /// setter.
    fn check_index(&mut self, id: NodeId, target: NodeId, index: NodeId) {
        self.check(target);
        self.check(index);
        let Some(target_ty) = self.ctx.tree.ty(target) else {
            return;
        };
        let Some(class) = target_ty.class() else {
            self.ctx.error(id, ErrorKind::InvalidExpression);
            return;
        };

        let this = self.ctx.tree.sym("this");
        let indexer = self.ctx.tree.find_member(class, this, |kind| {
            matches!(kind, NodeKind::Decl(Decl::Indexer(_)))
        });
        if let Some(indexer) = indexer {
            self.check(indexer);
            let NodeKind::Decl(Decl::Indexer(decl)) = &self.ctx.tree[indexer].kind else {
                return;
            };
            let param = decl.param;
            let accessor = if self.ctx.tree.assignment_target(id).is_some() {
                decl.set_fn
            } else {
                decl.get_fn
            };
            if accessor.is_none() {
                self.ctx.error(id, ErrorKind::InvalidExpression);
                return;
            }
            let expected = self.ctx.tree.ty(param);
            if let (Some(expected), Some(found)) = (expected, self.ctx.tree.ty(index)) {
                if !self.compatible(expected, found) {
                    self.ctx.error(index, ErrorKind::IncompatibleType);
                    return;
                }
            }
            self.ctx.tree[id].ty = self.ctx.tree.ty(indexer);
            if let NodeKind::Expr(Expr::Index { indexer: slot, .. }) = &mut self.ctx.tree[id].kind {
                *slot = Some(indexer);
            }
            return;
        }

        match self.ctx.tree.class(class).and_then(|decl| decl.element) {
            Some(element) => self.ctx.tree[id].ty = Some(Ty::Class(element)),
            None => self.ctx.error(id, ErrorKind::InvalidExpression),
        }
    }
}
