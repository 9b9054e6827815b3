//! C type system
//!
//! Represents the subset of C's type grammar this compiler supports and
//! implements the handful of relations the rest of the compiler leans on:
//! compatibility, assignment/cast legality, integer promotions, the usual
//! arithmetic conversions, and textual IR type names.

use std::fmt;

/// Integer variants, ordered by conversion rank (lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntKind {
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LLong,
    ULLong,
}

/// Floating-point variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloatKind {
    Float,
    Double,
    LongDouble,
}

/// A basic (non-derived) arithmetic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basic {
    Int(IntKind),
    Float(FloatKind),
}

/// Opaque handle identifying a struct or union in the [`TagRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(pub u32);

/// A C type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Basic(Basic),
    Pointer(Box<Type>),
    /// `None` size means an incomplete array type.
    Array(Box<Type>, Option<u64>),
    Function {
        ret: Box<Type>,
        /// `None` means an old-style unprototyped function.
        params: Option<FuncParams>,
    },
    Struct(TagId),
    Union(TagId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncParams {
    pub types: Vec<Type>,
    pub variadic: bool,
}

impl Type {
    pub fn int() -> Type {
        Type::Basic(Basic::Int(IntKind::Int))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Basic(Basic::Int(_)))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Basic(Basic::Float(_)))
    }

    pub fn is_arith(&self) -> bool {
        matches!(self, Type::Basic(_))
    }

    /// Scalar: arithmetic or pointer. Used for conditions and unary `!`.
    pub fn is_scalar(&self) -> bool {
        self.is_arith() || matches!(self, Type::Pointer(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_signed_int(&self) -> bool {
        use IntKind::*;
        matches!(
            self,
            Type::Basic(Basic::Int(Char | SChar | Short | Int | Long | LLong))
        )
    }

    pub fn is_unsigned_int(&self) -> bool {
        use IntKind::*;
        matches!(
            self,
            Type::Basic(Basic::Int(Bool | UChar | UShort | UInt | ULong | ULLong))
        )
    }

    /// Decay an array to a pointer to its element type, as happens in rvalue
    /// contexts (invariant (d) of the data model).
    pub fn decay(&self) -> Type {
        match self {
            Type::Array(elem, _) => Type::Pointer(elem.clone()),
            other => other.clone(),
        }
    }

    fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(t) => Some(t),
            _ => None,
        }
    }
}

/// Bit width and signedness table for [`IntKind`], matching the original's
/// fixed-width assumptions (invariant (a)).
pub fn int_bits(k: IntKind) -> u32 {
    use IntKind::*;
    match k {
        Bool => 1,
        Char | SChar | UChar => 8,
        Short | UShort => 16,
        Int | UInt => 32,
        Long | ULong | LLong | ULLong => 64,
    }
}

fn float_bits(k: FloatKind) -> u32 {
    match k {
        FloatKind::Float => 32,
        FloatKind::Double => 64,
        FloatKind::LongDouble => 128,
    }
}

/// `true` for `Char, SChar, UChar, Short, UShort` — ranks below `Int`.
fn rank_below_int(k: IntKind) -> bool {
    use IntKind::*;
    matches!(k, Bool | Char | SChar | UChar | Short | UShort)
}

fn to_unsigned(k: IntKind) -> IntKind {
    use IntKind::*;
    match k {
        Char | SChar => UChar,
        Short => UShort,
        Int => UInt,
        Long => ULong,
        LLong => ULLong,
        already => already,
    }
}

/// Errors raised by operations in this module that are only total over
/// arithmetic/scalar types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError(pub String);

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for TypeError {}

/// C's type compatibility relation (§4.A `is_compatible`).
pub fn is_compatible(t1: &Type, t2: &Type, tags: &TagRegistry) -> bool {
    match (t1, t2) {
        (Type::Void, Type::Void) => true,
        (Type::Basic(a), Type::Basic(b)) => a == b,
        (Type::Pointer(a), Type::Pointer(b)) => is_compatible(a, b, tags),
        (Type::Array(a, sa), Type::Array(b, sb)) => {
            is_compatible(a, b, tags) && (sa.is_none() || sb.is_none() || sa == sb)
        }
        (
            Type::Function {
                ret: r1,
                params: p1,
            },
            Type::Function {
                ret: r2,
                params: p2,
            },
        ) => {
            if !is_compatible(r1, r2, tags) {
                return false;
            }
            match (p1, p2) {
                (None, None) => true,
                // An unprototyped declaration is compatible with any argument
                // list.
                (None, Some(_)) | (Some(_), None) => true,
                (Some(a), Some(b)) => {
                    a.variadic == b.variadic
                        && a.types.len() == b.types.len()
                        && a.types
                            .iter()
                            .zip(&b.types)
                            .all(|(x, y)| is_compatible(x, y, tags))
                }
            }
        }
        (Type::Struct(a), Type::Struct(b)) => a == b,
        (Type::Union(a), Type::Union(b)) => a == b,
        _ => false,
    }
}

/// Assignment conversion legality (§4.A `can_assign`).
pub fn can_assign(src: &Type, dst: &Type, tags: &TagRegistry) -> bool {
    match (src, dst) {
        (s, d) if s.is_arith() && d.is_arith() => true,
        (Type::Pointer(_), Type::Basic(Basic::Int(IntKind::Bool))) => true,
        (Type::Pointer(a), Type::Pointer(b)) => {
            a.is_void() || b.is_void() || is_compatible(a, b, tags)
        }
        (Type::Struct(a), Type::Struct(b)) => a == b,
        (Type::Union(a), Type::Union(b)) => a == b,
        _ => false,
    }
}

/// Cast legality (§4.A `can_cast`) — a superset of [`can_assign`].
pub fn can_cast(src: &Type, dst: &Type, tags: &TagRegistry) -> bool {
    if can_assign(src, dst, tags) {
        return true;
    }
    match (src, dst) {
        (s, Type::Pointer(_)) if s.is_integer() => true,
        (Type::Pointer(_), d) if d.is_integer() => true,
        (Type::Pointer(a), Type::Pointer(b)) if a.pointee().is_some() || b.pointee().is_some() => {
            matches!(**a, Type::Function { .. }) == matches!(**b, Type::Function { .. })
        }
        _ => false,
    }
}

/// Integer promotion (§4.A `integer_promotions`): ranks below `Int` promote
/// to `Int` if it can hold every value of the source type, else `UInt`.
/// Floats and ranks at or above `Int` are unchanged.
pub fn integer_promotions(t: Basic) -> Basic {
    match t {
        Basic::Float(_) => t,
        Basic::Int(k) if rank_below_int(k) => {
            if int_bits(k) < 32 || (int_bits(k) == 32 && k != IntKind::UInt) {
                Basic::Int(IntKind::Int)
            } else {
                Basic::Int(IntKind::UInt)
            }
        }
        Basic::Int(_) => t,
    }
}

/// The usual arithmetic conversions (§4.A), applied to two arithmetic types.
pub fn usual_arithmetic_conversions(t1: &Type, t2: &Type) -> Result<Basic, TypeError> {
    let (b1, b2) = match (t1, t2) {
        (Type::Basic(a), Type::Basic(b)) => (*a, *b),
        _ => {
            return Err(TypeError(format!(
                "usual arithmetic conversions require arithmetic operands, got {:?} and {:?}",
                t1, t2
            )));
        }
    };

    if let (Basic::Float(f1), Basic::Float(f2)) = (b1, b2) {
        return Ok(Basic::Float(if f1 >= f2 { f1 } else { f2 }));
    }
    if let Basic::Float(_) = b1 {
        return Ok(b1);
    }
    if let Basic::Float(_) = b2 {
        return Ok(b2);
    }

    let (Basic::Int(i1), Basic::Int(i2)) = (integer_promotions(b1), integer_promotions(b2)) else {
        unreachable!("integer_promotions never returns a float for an integer input")
    };

    if i1 == i2 {
        return Ok(Basic::Int(i1));
    }
    let s1 = i1 != to_unsigned(i1);
    let s2 = i2 != to_unsigned(i2);
    let common = if s1 == s2 {
        if i1 >= i2 { i1 } else { i2 }
    } else {
        let (unsigned, signed) = if s1 { (i2, i1) } else { (i1, i2) };
        if int_bits(unsigned) >= int_bits(signed) {
            unsigned
        } else if can_represent(signed, max_unsigned_value(unsigned)) {
            signed
        } else {
            to_unsigned(signed)
        }
    };
    Ok(Basic::Int(common))
}

fn max_unsigned_value(k: IntKind) -> u64 {
    if int_bits(k) >= 64 {
        u64::MAX
    } else {
        (1u64 << int_bits(k)) - 1
    }
}

/// Whether `target`'s range can represent `value` (§4.A `can_represent`).
/// Used both internally above and for constant-narrowing checks.
pub fn can_represent(target: IntKind, value: u64) -> bool {
    let bits = int_bits(target);
    if target.is_unsigned_kind() {
        bits >= 64 || value <= max_unsigned_value(target)
    } else {
        let max = if bits >= 64 {
            i64::MAX as u64
        } else {
            (1u64 << (bits - 1)) - 1
        };
        value <= max
    }
}

impl IntKind {
    fn is_unsigned_kind(self) -> bool {
        use IntKind::*;
        matches!(self, Bool | UChar | UShort | UInt | ULong | ULLong)
    }
}

/// Size in bytes. Pointer types are always 8 bytes / 8-aligned (invariant c).
pub fn size(t: &Type, tags: &TagRegistry) -> u64 {
    match t {
        Type::Void => 0,
        Type::Basic(Basic::Int(k)) => (int_bits(*k) as u64).div_ceil(8),
        Type::Basic(Basic::Float(k)) => (float_bits(*k) as u64) / 8,
        Type::Pointer(_) => 8,
        Type::Array(elem, Some(n)) => size(elem, tags) * n,
        Type::Array(_, None) => 0,
        Type::Function { .. } => 0,
        Type::Struct(id) => tags.get(*id).map(|d| d.size(tags)).unwrap_or(0),
        Type::Union(id) => tags.get(*id).map(|d| d.size(tags)).unwrap_or(0),
    }
}

pub fn align(t: &Type, tags: &TagRegistry) -> u64 {
    match t {
        Type::Void => 1,
        Type::Pointer(_) => 8,
        Type::Array(elem, _) => align(elem, tags),
        Type::Struct(id) => tags.get(*id).map(|d| d.align(tags)).unwrap_or(1),
        Type::Union(id) => tags.get(*id).map(|d| d.align(tags)).unwrap_or(1),
        _ => size(t, tags).max(1),
    }
}

/// Textual IR type name (§4.A `ir_type`).
pub fn ir_type(t: &Type, tags: &TagRegistry) -> String {
    match t {
        Type::Void => "void".to_string(),
        Type::Basic(Basic::Int(k)) => format!("i{}", int_bits(*k)),
        Type::Basic(Basic::Float(FloatKind::Float)) => "float".to_string(),
        Type::Basic(Basic::Float(FloatKind::Double)) => "double".to_string(),
        Type::Basic(Basic::Float(FloatKind::LongDouble)) => "fp128".to_string(),
        Type::Pointer(inner) => format!("{}*", ir_type(inner, tags)),
        Type::Array(elem, Some(n)) => format!("[{} x {}]", n, ir_type(elem, tags)),
        Type::Array(elem, None) => format!("[0 x {}]", ir_type(elem, tags)),
        Type::Function { ret, params } => {
            let param_list = params
                .as_ref()
                .map(|p| {
                    p.types
                        .iter()
                        .map(|t| ir_type(t, tags))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            format!("{} ({})", ir_type(ret, tags), param_list)
        }
        Type::Struct(id) => format!("%struct.{}", id.0),
        Type::Union(id) => format!("%union.{}", id.0),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Basic(Basic::Int(k)) => write!(f, "{:?}", k),
            Type::Basic(Basic::Float(k)) => write!(f, "{:?}", k),
            Type::Pointer(t) => write!(f, "{}*", t),
            Type::Array(t, Some(n)) => write!(f, "{}[{}]", t, n),
            Type::Array(t, None) => write!(f, "{}[]", t),
            Type::Function { ret, .. } => write!(f, "function returning {}", ret),
            Type::Struct(id) => write!(f, "struct#{}", id.0),
            Type::Union(id) => write!(f, "union#{}", id.0),
        }
    }
}

/// A struct or union member: a name and a type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggKind {
    Struct,
    Union,
}

/// A tag definition: either an incomplete forward declaration or a complete
/// member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDef {
    pub name: String,
    pub kind: AggKind,
    pub members: Option<Vec<Member>>,
}

impl TagDef {
    fn size(&self, tags: &TagRegistry) -> u64 {
        let Some(members) = &self.members else {
            return 0;
        };
        match self.kind {
            AggKind::Union => members.iter().map(|m| size(&m.ty, tags)).max().unwrap_or(0),
            AggKind::Struct => {
                let mut offset = 0u64;
                let mut max_align = 1u64;
                for m in members {
                    let a = align(&m.ty, tags);
                    max_align = max_align.max(a);
                    offset = offset.div_ceil(a) * a;
                    offset += size(&m.ty, tags);
                }
                offset.div_ceil(max_align) * max_align
            }
        }
    }

    fn align(&self, tags: &TagRegistry) -> u64 {
        match &self.members {
            None => 1,
            Some(members) => members
                .iter()
                .map(|m| align(&m.ty, tags))
                .max()
                .unwrap_or(1),
        }
    }
}

/// Process-wide (well: per-[`TagRegistry`]-instance) map from tag identity to
/// definition. See design note on the process-global tag registry: here it is
/// an owned field threaded through the analyzer and codegen rather than a
/// `static`, so tests can construct a fresh one per compilation.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    defs: Vec<TagDef>,
    by_name: std::collections::HashMap<(AggKind, String), TagId>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TagId) -> Option<&TagDef> {
        self.defs.get(id.0 as usize)
    }

    /// Look up an existing tag of the given kind and name, if declared.
    pub fn lookup(&self, kind: AggKind, name: &str) -> Option<TagId> {
        self.by_name.get(&(kind, name.to_string())).copied()
    }

    /// Declare (possibly incomplete) or complete a tag.
    ///
    /// Redeclaration with a compatible incomplete type is permitted;
    /// redefinition is an error; completing a previously-incomplete
    /// declaration is permitted once.
    pub fn declare(
        &mut self,
        kind: AggKind,
        name: &str,
        members: Option<Vec<Member>>,
    ) -> Result<TagId, TypeError> {
        if let Some(id) = self.lookup(kind, name) {
            let existing = &mut self.defs[id.0 as usize];
            match (&existing.members, &members) {
                (Some(_), Some(_)) => {
                    return Err(TypeError(format!("redefinition of '{}'", name)));
                }
                (None, Some(_)) => {
                    existing.members = members;
                }
                _ => {}
            }
            return Ok(id);
        }
        let id = TagId(self.defs.len() as u32);
        self.defs.push(TagDef {
            name: name.to_string(),
            kind,
            members,
        });
        self.by_name.insert((kind, name.to_string()), id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_is_idempotent() {
        for k in [
            IntKind::Bool,
            IntKind::Char,
            IntKind::UChar,
            IntKind::Short,
            IntKind::Int,
            IntKind::UInt,
            IntKind::Long,
            IntKind::ULLong,
        ] {
            let once = integer_promotions(Basic::Int(k));
            let twice = integer_promotions(once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn compatibility_is_reflexive_and_symmetric() {
        let tags = TagRegistry::new();
        let cases = [
            Type::Void,
            Type::int(),
            Type::Pointer(Box::new(Type::int())),
            Type::Array(Box::new(Type::int()), Some(4)),
            Type::Basic(Basic::Float(FloatKind::Double)),
        ];
        for a in &cases {
            assert!(is_compatible(a, a, &tags));
            for b in &cases {
                assert_eq!(is_compatible(a, b, &tags), is_compatible(b, a, &tags));
            }
        }
    }

    #[test]
    fn usual_arithmetic_conversions_prefers_unsigned_same_rank() {
        let t = usual_arithmetic_conversions(
            &Type::Basic(Basic::Int(IntKind::Int)),
            &Type::Basic(Basic::Int(IntKind::UInt)),
        )
        .unwrap();
        assert_eq!(t, Basic::Int(IntKind::UInt));
    }

    #[test]
    fn usual_arithmetic_conversions_picks_signed_when_it_can_represent_unsigned() {
        // long vs unsigned int: long can represent all unsigned int values.
        let t = usual_arithmetic_conversions(
            &Type::Basic(Basic::Int(IntKind::Long)),
            &Type::Basic(Basic::Int(IntKind::UInt)),
        )
        .unwrap();
        assert_eq!(t, Basic::Int(IntKind::Long));
    }

    #[test]
    fn long_double_dominates() {
        let t = usual_arithmetic_conversions(
            &Type::Basic(Basic::Float(FloatKind::LongDouble)),
            &Type::Basic(Basic::Float(FloatKind::Float)),
        )
        .unwrap();
        assert_eq!(t, Basic::Float(FloatKind::LongDouble));
    }

    #[test]
    fn ir_type_names() {
        let tags = TagRegistry::new();
        assert_eq!(ir_type(&Type::Basic(Basic::Int(IntKind::Bool)), &tags), "i1");
        assert_eq!(ir_type(&Type::int(), &tags), "i32");
        assert_eq!(
            ir_type(&Type::Pointer(Box::new(Type::int())), &tags),
            "i32*"
        );
    }

    #[test]
    fn array_decays_to_pointer() {
        let arr = Type::Array(Box::new(Type::int()), Some(3));
        assert_eq!(arr.decay(), Type::Pointer(Box::new(Type::int())));
    }

    #[test]
    fn tag_registry_allows_completing_once() {
        let mut tags = TagRegistry::new();
        let id = tags.declare(AggKind::Struct, "point", None).unwrap();
        let id2 = tags
            .declare(
                AggKind::Struct,
                "point",
                Some(vec![
                    Member {
                        name: "x".into(),
                        ty: Type::int(),
                    },
                    Member {
                        name: "y".into(),
                        ty: Type::int(),
                    },
                ]),
            )
            .unwrap();
        assert_eq!(id, id2);
        assert!(tags.declare(AggKind::Struct, "point", Some(vec![])).is_err());
    }
}
