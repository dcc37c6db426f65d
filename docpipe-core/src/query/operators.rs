//! Operator registry
//!
//! Every operator the engine understands is a variant of one of the closed
//! enums below, grouped by category. Names are resolved once, when criteria,
//! expressions or pipelines are compiled.

use std::fmt;

/// Leaf query operators: `(actual, operand) -> bool`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleOp {
    Eq,
    Ne,
    In,
    Nin,
    Lt,
    Lte,
    Gt,
    Gte,
    Mod,
    Regex,
    Exists,
    All,
    Size,
}

impl SimpleOp {
    pub const ALL: [SimpleOp; 13] = [
        SimpleOp::Eq,
        SimpleOp::Ne,
        SimpleOp::In,
        SimpleOp::Nin,
        SimpleOp::Lt,
        SimpleOp::Lte,
        SimpleOp::Gt,
        SimpleOp::Gte,
        SimpleOp::Mod,
        SimpleOp::Regex,
        SimpleOp::Exists,
        SimpleOp::All,
        SimpleOp::Size,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "$eq" => SimpleOp::Eq,
            "$ne" => SimpleOp::Ne,
            "$in" => SimpleOp::In,
            "$nin" => SimpleOp::Nin,
            "$lt" => SimpleOp::Lt,
            "$lte" => SimpleOp::Lte,
            "$gt" => SimpleOp::Gt,
            "$gte" => SimpleOp::Gte,
            "$mod" => SimpleOp::Mod,
            "$regex" => SimpleOp::Regex,
            "$exists" => SimpleOp::Exists,
            "$all" => SimpleOp::All,
            "$size" => SimpleOp::Size,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            SimpleOp::Eq => "$eq",
            SimpleOp::Ne => "$ne",
            SimpleOp::In => "$in",
            SimpleOp::Nin => "$nin",
            SimpleOp::Lt => "$lt",
            SimpleOp::Lte => "$lte",
            SimpleOp::Gt => "$gt",
            SimpleOp::Gte => "$gte",
            SimpleOp::Mod => "$mod",
            SimpleOp::Regex => "$regex",
            SimpleOp::Exists => "$exists",
            SimpleOp::All => "$all",
            SimpleOp::Size => "$size",
        }
    }
}

/// Logical query operators built over nested queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundOp {
    And,
    Or,
    Nor,
    Not,
    ElemMatch,
    Where,
}

impl CompoundOp {
    pub const ALL: [CompoundOp; 6] = [
        CompoundOp::And,
        CompoundOp::Or,
        CompoundOp::Nor,
        CompoundOp::Not,
        CompoundOp::ElemMatch,
        CompoundOp::Where,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "$and" => CompoundOp::And,
            "$or" => CompoundOp::Or,
            "$nor" => CompoundOp::Nor,
            "$not" => CompoundOp::Not,
            "$elemMatch" => CompoundOp::ElemMatch,
            "$where" => CompoundOp::Where,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            CompoundOp::And => "$and",
            CompoundOp::Or => "$or",
            CompoundOp::Nor => "$nor",
            CompoundOp::Not => "$not",
            CompoundOp::ElemMatch => "$elemMatch",
            CompoundOp::Where => "$where",
        }
    }

    /// Operators that need a field to apply to
    pub fn requires_field(self) -> bool {
        matches!(self, CompoundOp::Not | CompoundOp::ElemMatch)
    }
}

/// Expression operators evaluated against a single document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Cmp,
    Concat,
    Strcasecmp,
    Substr,
    ToLower,
    ToUpper,
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl AggregateOp {
    pub const ALL: [AggregateOp; 17] = [
        AggregateOp::Add,
        AggregateOp::Subtract,
        AggregateOp::Multiply,
        AggregateOp::Divide,
        AggregateOp::Mod,
        AggregateOp::Cmp,
        AggregateOp::Concat,
        AggregateOp::Strcasecmp,
        AggregateOp::Substr,
        AggregateOp::ToLower,
        AggregateOp::ToUpper,
        AggregateOp::Eq,
        AggregateOp::Ne,
        AggregateOp::Gt,
        AggregateOp::Gte,
        AggregateOp::Lt,
        AggregateOp::Lte,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "$add" => AggregateOp::Add,
            "$subtract" => AggregateOp::Subtract,
            "$multiply" => AggregateOp::Multiply,
            "$divide" => AggregateOp::Divide,
            "$mod" => AggregateOp::Mod,
            "$cmp" => AggregateOp::Cmp,
            "$concat" => AggregateOp::Concat,
            "$strcasecmp" => AggregateOp::Strcasecmp,
            "$substr" => AggregateOp::Substr,
            "$toLower" => AggregateOp::ToLower,
            "$toUpper" => AggregateOp::ToUpper,
            "$eq" => AggregateOp::Eq,
            "$ne" => AggregateOp::Ne,
            "$gt" => AggregateOp::Gt,
            "$gte" => AggregateOp::Gte,
            "$lt" => AggregateOp::Lt,
            "$lte" => AggregateOp::Lte,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            AggregateOp::Add => "$add",
            AggregateOp::Subtract => "$subtract",
            AggregateOp::Multiply => "$multiply",
            AggregateOp::Divide => "$divide",
            AggregateOp::Mod => "$mod",
            AggregateOp::Cmp => "$cmp",
            AggregateOp::Concat => "$concat",
            AggregateOp::Strcasecmp => "$strcasecmp",
            AggregateOp::Substr => "$substr",
            AggregateOp::ToLower => "$toLower",
            AggregateOp::ToUpper => "$toUpper",
            AggregateOp::Eq => "$eq",
            AggregateOp::Ne => "$ne",
            AggregateOp::Gt => "$gt",
            AggregateOp::Gte => "$gte",
            AggregateOp::Lt => "$lt",
            AggregateOp::Lte => "$lte",
        }
    }

    /// Exact number of arguments, or `None` for variadic operators
    pub fn arity(self) -> Option<usize> {
        match self {
            AggregateOp::Add | AggregateOp::Multiply | AggregateOp::Concat => None,
            AggregateOp::Substr => Some(3),
            AggregateOp::ToLower | AggregateOp::ToUpper => Some(1),
            _ => Some(2),
        }
    }

    /// The leaf query operator a comparison expression reuses
    pub fn comparison(self) -> Option<SimpleOp> {
        match self {
            AggregateOp::Eq => Some(SimpleOp::Eq),
            AggregateOp::Ne => Some(SimpleOp::Ne),
            AggregateOp::Gt => Some(SimpleOp::Gt),
            AggregateOp::Gte => Some(SimpleOp::Gte),
            AggregateOp::Lt => Some(SimpleOp::Lt),
            AggregateOp::Lte => Some(SimpleOp::Lte),
            _ => None,
        }
    }
}

/// Accumulators applied over a `$group` bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupOp {
    Sum,
    Avg,
    Max,
    Min,
    Push,
    AddToSet,
    First,
    Last,
}

impl GroupOp {
    pub const ALL: [GroupOp; 8] = [
        GroupOp::Sum,
        GroupOp::Avg,
        GroupOp::Max,
        GroupOp::Min,
        GroupOp::Push,
        GroupOp::AddToSet,
        GroupOp::First,
        GroupOp::Last,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "$sum" => GroupOp::Sum,
            "$avg" => GroupOp::Avg,
            "$max" => GroupOp::Max,
            "$min" => GroupOp::Min,
            "$push" => GroupOp::Push,
            "$addToSet" => GroupOp::AddToSet,
            "$first" => GroupOp::First,
            "$last" => GroupOp::Last,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            GroupOp::Sum => "$sum",
            GroupOp::Avg => "$avg",
            GroupOp::Max => "$max",
            GroupOp::Min => "$min",
            GroupOp::Push => "$push",
            GroupOp::AddToSet => "$addToSet",
            GroupOp::First => "$first",
            GroupOp::Last => "$last",
        }
    }
}

/// Aggregation pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageOp {
    Match,
    Project,
    Group,
    Sort,
    Skip,
    Limit,
    Unwind,
}

impl StageOp {
    pub const ALL: [StageOp; 7] = [
        StageOp::Match,
        StageOp::Project,
        StageOp::Group,
        StageOp::Sort,
        StageOp::Skip,
        StageOp::Limit,
        StageOp::Unwind,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "$match" => StageOp::Match,
            "$project" => StageOp::Project,
            "$group" => StageOp::Group,
            "$sort" => StageOp::Sort,
            "$skip" => StageOp::Skip,
            "$limit" => StageOp::Limit,
            "$unwind" => StageOp::Unwind,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            StageOp::Match => "$match",
            StageOp::Project => "$project",
            StageOp::Group => "$group",
            StageOp::Sort => "$sort",
            StageOp::Skip => "$skip",
            StageOp::Limit => "$limit",
            StageOp::Unwind => "$unwind",
        }
    }
}

macro_rules! impl_display_by_name {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }
        )*
    };
}

impl_display_by_name!(SimpleOp, CompoundOp, AggregateOp, GroupOp, StageOp);

/// True if `name` is a leaf or logical query operator
pub fn is_query_operator(name: &str) -> bool {
    SimpleOp::from_name(name).is_some() || CompoundOp::from_name(name).is_some()
}
