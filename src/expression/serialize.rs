use crate::expression::ast::{CallOp, ExprKind, Expression};
use crate::types::ty::Type;
use crate::types::value::Value;
use serde_json::{Value as Json, json};

impl Expression {
    /// Canonical expression JSON for this node.
    ///
    /// Array and object constants are wrapped in `literal`, colors become an
    /// `rgba` call and implicit annotations are spelled out, so compiling the
    /// output again yields the same results.
    pub fn to_json(&self) -> Json {
        match &self.kind {
            ExprKind::Literal(v) => literal_json(v),
            ExprKind::Var { name, .. } => json!(["var", name]),
            ExprKind::Let { bindings, body } => {
                let mut out = vec![Json::from("let")];
                for b in bindings {
                    out.push(Json::from(b.name.as_str()));
                    out.push(b.value.to_json());
                }
                out.push(body.to_json());
                Json::Array(out)
            }
            ExprKind::Call { name, op, args } => self.call_json(name, op, args),
            ExprKind::Poison => Json::Null,
        }
    }

    fn call_json(&self, name: &str, op: &CallOp, args: &[Expression]) -> Json {
        let mut out = vec![Json::from(name)];
        match op {
            CallOp::Match(spec) => {
                let (input, rest) = match args.split_first() {
                    Some(split) => split,
                    None => return Json::Array(out),
                };
                out.push(input.to_json());
                for (labels, output) in spec.labels.iter().zip(rest) {
                    out.push(match labels.as_slice() {
                        [single] => single.to_json(),
                        many => Json::Array(many.iter().map(|k| k.to_json()).collect()),
                    });
                    out.push(output.to_json());
                }
                if let Some(fallback) = rest.last() {
                    out.push(fallback.to_json());
                }
            }
            CallOp::Step { stops } => {
                let mut args = args.iter();
                out.extend(args.next().map(Expression::to_json));
                out.extend(args.next().map(Expression::to_json));
                for (stop, output) in stops.iter().skip(1).zip(args) {
                    out.push(json!(stop));
                    out.push(output.to_json());
                }
            }
            CallOp::Interpolate { curve, stops } => {
                out.push(curve.to_json());
                let mut args = args.iter();
                out.extend(args.next().map(Expression::to_json));
                for (stop, output) in stops.iter().zip(args) {
                    out.push(json!(stop));
                    out.push(output.to_json());
                }
            }
            CallOp::Assert if name == "array" => {
                if let Type::Array { item, len } = &self.ty
                    && (**item != Type::Value || len.is_some())
                {
                    out.push(Json::from(item.kind_name()));
                    if let Some(n) = len {
                        out.push(Json::from(*n));
                    }
                }
                out.extend(args.iter().map(Expression::to_json));
            }
            _ => out.extend(args.iter().map(Expression::to_json)),
        }
        Json::Array(out)
    }
}

fn literal_json(v: &Value) -> Json {
    match v {
        Value::Array(_) | Value::Object(_) => json!(["literal", v.to_json()]),
        Value::Color(c) => {
            let [r, g, b, a] = c.to_rgba_array();
            json!(["rgba", r, g, b, a])
        }
        scalar => scalar.to_json(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/serialize.rs"]
mod tests;
