use std::fmt;
use std::ops::Range;

/// Absolute block coordinates. The identity key for spatial occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Position {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Position { x, y, z }
    }

    pub fn offset(&self, dx: i64, dy: i64, dz: i64) -> Self {
        Position::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn below(&self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The six orthogonal neighbours, in a fixed order.
    pub fn neighbors(&self) -> [Position; 6] {
        [
            self.offset(1, 0, 0),
            self.offset(-1, 0, 0),
            self.offset(0, 1, 0),
            self.offset(0, -1, 0),
            self.offset(0, 0, 1),
            self.offset(0, 0, -1),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Facing {
    pub fn from_name(name: &str) -> Option<Facing> {
        match name {
            "north" => Some(Facing::North),
            "south" => Some(Facing::South),
            "east" => Some(Facing::East),
            "west" => Some(Facing::West),
            "up" => Some(Facing::Up),
            "down" => Some(Facing::Down),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Facing::North => "north",
            Facing::South => "south",
            Facing::East => "east",
            Facing::West => "west",
            Facing::Up => "up",
            Facing::Down => "down",
        }
    }

    /// Unit vector of the direction faced. North is -z, east is +x, up is +y.
    pub fn delta(&self) -> (i64, i64, i64) {
        match self {
            Facing::North => (0, 0, -1),
            Facing::South => (0, 0, 1),
            Facing::East => (1, 0, 0),
            Facing::West => (-1, 0, 0),
            Facing::Up => (0, 1, 0),
            Facing::Down => (0, -1, 0),
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully evaluated runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
    Pos(Position),
    Facing(Facing),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Pos(_) => "position",
            Value::Facing(_) => "facing",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Pos(p) => write!(f, "{}", p),
            Value::Facing(d) => write!(f, "{}", d),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Int(i64),
    Str(String),
    Bool(bool),

    Variable(String),

    /// `(x, y, z)` position tuples; parenthesized single expressions never
    /// reach this variant.
    Tuple(Vec<(Expr, Range<usize>)>),

    /// `instance.attr` lookups, used inside assertions.
    Attr {
        target: (String, Range<usize>),
        attr: String,
    },

    BinOp {
        operator: BinOp,
        l_value: Box<(Expr, Range<usize>)>,
        r_value: Box<(Expr, Range<usize>)>,
    },

    UnOp {
        unop: UnOp,
        expression: Box<(Expr, Range<usize>)>,
    },

    Error, // dummy node for error recovery
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,

    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,

    And,
    Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum UnOp {
    Minus,
    Not,
}

/// A named argument in a def/assignment statement. The call form spells
/// these `name=expr`, the field form `name: expr`; both land here.
#[derive(Debug, Clone)]
pub struct Arg {
    pub name: (String, Range<usize>),
    pub value: (Expr, Range<usize>),
}

#[derive(Debug, Clone)]
pub enum ImportList {
    All,
    Names(Vec<(String, Range<usize>)>),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `def name Type(arg=..., ...)` or `name = Type(field: ..., ...)`.
    /// `ty` is either a catalog element type or a user module name; which
    /// one is decided at expansion time.
    Def {
        name: (String, Range<usize>),
        ty: (String, Range<usize>),
        args: Vec<Arg>,
    },

    For {
        var: (String, Range<usize>),
        start: (Expr, Range<usize>),
        end: (Expr, Range<usize>),
        body: Vec<(Stmt, Range<usize>)>,
    },

    If {
        condition: (Expr, Range<usize>),
        then_body: Vec<(Stmt, Range<usize>)>,
        else_body: Option<Vec<(Stmt, Range<usize>)>>,
    },

    Assert {
        condition: (Expr, Range<usize>),
    },

    Import {
        path: (String, Range<usize>),
        names: ImportList,
    },

    Error, // dummy node for error recovery
}

/// A parsed module definition. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct ModuleDef {
    pub name: (String, Range<usize>),
    pub params: Vec<Param>,
    pub body: Vec<(Stmt, Range<usize>)>,
    pub file: String,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: (String, Range<usize>),
    pub default: Option<(Expr, Range<usize>)>,
}

#[derive(Debug)]
pub enum ASTNode {
    Module(ModuleDef),
    Stmt((Stmt, Range<usize>)),
}
