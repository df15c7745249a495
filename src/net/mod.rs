//! # Petri 网核心定义（Place/Transition Net）
//!
//! 设库所集合 `P` 与迁移集合 `T`。定义输入/输出映射
//! `Pre, Post ∈ ℕ^{|P|×|T|}` 以及迁移效应矩阵 `C = Post - Pre`。
//! 对任意标识 `M ∈ ℕ^{|P|}`：
//!
//! * 迁移 `t ∈ T` **可激发** 当且仅当 `∀p ∈ P: M[p] ≥ Pre[p, t]`；
//! * 迁移发射后标识满足 `M' = M + C[:, t]`。
//!
//! Nets produced by the random builder only ever carry arc weights 0 and 1;
//! the serialized form is the row-major flattened `P x (2T + 1)` matrix
//! `[Pre | Post | M₀]`.
//!
//! ## 示例
//!
//! ```rust
//! use spn_bench::net::{PetriNet, PlaceId, TransitionId};
//!
//! let mut net = PetriNet::new(2, 1);
//! net.set_pre(PlaceId::new(0), TransitionId::new(0), 1);
//! net.set_post(PlaceId::new(1), TransitionId::new(0), 1);
//! net.set_initial_tokens(PlaceId::new(0), 1);
//!
//! assert_eq!(net.flatten(), vec![1, 0, 1, 0, 1, 0]);
//! ```

pub mod core;
pub mod ids;
pub mod incidence;
pub mod index_vec;

pub use self::core::{Marking, NetError, PetriNet, Tokens};
pub use ids::{PlaceId, TransitionId, VertexId};
pub use incidence::Incidence;
pub use index_vec::{Idx, IndexVec};
