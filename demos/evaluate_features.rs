use style_expr::{EvaluationContext, Feature, Type, Value, compile_str};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let width = compile_str(
        include_str!("../tests/data/road_width.json"),
        Some(&Type::Number),
    )?;
    let features: Vec<Feature> = serde_json::from_str(include_str!("../tests/data/roads.json"))?;

    println!(
        "width: {} (zoom-constant: {}, feature-constant: {})",
        width.ty(),
        width.is_zoom_constant(),
        width.is_feature_constant()
    );
    for z in [4.0, 10.0, 16.0] {
        for f in &features {
            let ctx = EvaluationContext::new(z, f);
            let w = width.evaluate_or(&ctx, Value::Number(1.0));
            println!("zoom {z:>4}: {:<10} -> {}", label(f), w.to_display_string());
        }
    }

    Ok(())
}

fn label(f: &Feature) -> String {
    f.properties
        .get("class")
        .map(Value::to_display_string)
        .unwrap_or_else(|| "?".to_owned())
}
