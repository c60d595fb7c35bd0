pub mod compiler;
pub mod condition;
pub mod fluent;
pub mod method;
pub mod page;
pub mod predicate;
pub mod shape;
pub mod sort;

pub use compiler::CompiledQuery;
pub use condition::{Condition, Conjunction, Operand};
pub use fluent::{DeleteQuery, OrderBy, SelectQuery};
pub use method::{MethodKind, MethodQuery};
pub use page::{Page, Pageable};
pub use predicate::{EntityPredicate, Operator};
pub use shape::{QueryOutput, ReturnShape};
pub use sort::{Direction, RecordComparator, Sort};
