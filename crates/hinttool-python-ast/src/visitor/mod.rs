// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor and collector infrastructure for AST traversal.
//!
//! - [`traits`]: the [`Visitor`] trait and [`VisitResult`]
//! - [`dispatch`]: `walk_*` functions driving a visitor over the tree
//! - [`binding`]: binding-target collection with syntactic contexts
//! - [`scope`]: scope and named-binding indexing
//! - [`signature`]: function-definition collection with class context
//! - [`type_comment`]: legacy `# type:` comment scanning
//! - [`batch_edit`]: span-based batch editing with reverse-order apply

pub mod batch_edit;
pub mod binding;
pub mod dispatch;
pub mod scope;
pub mod signature;
pub mod traits;
pub mod type_comment;

pub use batch_edit::{BatchEditError, BatchSpanEditor, EditPrimitive};
pub use binding::{TargetCollector, TargetContext, TargetInfo};
pub use dispatch::{
    walk_expression, walk_function_def, walk_module, walk_parameters, walk_statement, walk_suite,
};
pub use scope::{
    BindingKind, ScopeId, ScopeIndex, ScopeInfo, ScopeKind, ScopedBinding,
};
pub use signature::{FunctionCollector, FunctionInfo};
pub use traits::{VisitResult, Visitor};
pub use type_comment::{TypeComment, TypeCommentCollector, TypeCommentKind};
