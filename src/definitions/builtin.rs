/// Implementation id of a compound (signature-resolved) operator overload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `!`.
    Not,
    /// `all`.
    All,
    /// `any`.
    Any,

    /// `+`.
    Add,
    /// `*`.
    Mul,
    /// Binary `-`.
    Sub,
    /// Unary `-`.
    Neg,
    /// `/`.
    Div,
    /// `%`.
    Rem,
    /// `^`.
    Pow,
    /// `abs`.
    Abs,
    /// `ceil`.
    Ceil,
    /// `floor`.
    Floor,
    /// `round` (half away from zero).
    Round,
    /// `sqrt`.
    Sqrt,
    /// `ln`.
    Ln,
    /// `log10`.
    Log10,
    /// `log2`.
    Log2,
    /// `sin`.
    Sin,
    /// `cos`.
    Cos,
    /// `tan`.
    Tan,
    /// `asin`.
    Asin,
    /// `acos`.
    Acos,
    /// `atan`.
    Atan,
    /// `min`.
    Min,
    /// `max`.
    Max,
    /// `e`.
    E,
    /// `pi`.
    Pi,
    /// `ln2`.
    Ln2,

    /// `zoom`.
    Zoom,
    /// `get` on the feature properties.
    Get,
    /// `get` on an object argument.
    GetFrom,
    /// `has` on the feature properties.
    Has,
    /// `has` on an object argument.
    HasIn,
    /// `properties`.
    Properties,
    /// `geometry-type`.
    GeometryType,
    /// `id`.
    Id,
    /// `feature-state`.
    FeatureState,

    /// `length`.
    Length,
    /// `in`.
    In,
    /// `index-of`.
    IndexOf,
    /// `index-of` with a start index.
    IndexOfFrom,
    /// `slice` to the end.
    Slice,
    /// `slice` with an end index.
    SliceRange,
    /// `at`.
    At,

    /// `concat`.
    Concat,
    /// `upcase`.
    Upcase,
    /// `downcase`.
    Downcase,

    /// `to-boolean`.
    ToBoolean,
    /// `to-string`.
    ToString,
    /// `typeof`.
    TypeOf,

    /// `rgb`.
    Rgb,
    /// `rgba`.
    Rgba,
    /// `to-rgba`.
    ToRgba,
}

/// What a builtin reads from the runtime context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dependence {
    /// Reads the zoom level.
    pub zoom: bool,
    /// Reads feature properties, geometry, id or feature state.
    pub feature: bool,
}

impl Builtin {
    /// Context dependence, consumed by the classifier and the constant folder.
    ///
    /// `GetFrom`/`HasIn` look into an object argument, not the feature.
    pub fn dependence(self) -> Dependence {
        match self {
            Self::Zoom => Dependence {
                zoom: true,
                feature: false,
            },
            Self::Get
            | Self::Has
            | Self::Properties
            | Self::GeometryType
            | Self::Id
            | Self::FeatureState => Dependence {
                zoom: false,
                feature: true,
            },
            _ => Dependence::default(),
        }
    }
}

/// Comparison operators; parsed as a special form, evaluated by the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==`.
    Eq,
    /// `!=`.
    Ne,
    /// `<`.
    Lt,
    /// `<=`.
    Le,
    /// `>`.
    Gt,
    /// `>=`.
    Ge,
}

impl CompareOp {
    /// Operator name as written in expressions.
    pub fn name(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// `==` and `!=` accept any comparable type; the rest need an ordering.
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }
}

/// Result kind of the variadic conversion forms `to-number` and `to-color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoerceTarget {
    /// `to-number`.
    Number,
    /// `to-color`.
    Color,
}
