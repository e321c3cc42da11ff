mod binary_op;
pub use binary_op::BinaryOp;

mod direction;
pub use direction::Direction;

mod handle;
pub use handle::Handle;

mod operand;
pub use operand::Operand;

mod predicate;
pub use predicate::Predicate;

mod predicate_binary_op;
pub use predicate_binary_op::PredicateBinaryOp;

mod resource_id;
pub use resource_id::ResourceId;

mod sort_key;
pub use sort_key::SortKey;

mod ty;
pub use ty::Type;

mod value;
pub use value::Value;

mod value_map;
pub use value_map::ValueMap;
