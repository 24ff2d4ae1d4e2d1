use kotlite::{EvaluationContext, InterpreterConfig};

fn main() -> anyhow::Result<()> {
    let program = [
        "fun main() { println(\"hello\") }",
        "fun square(n: Int): Int { return n * n }\nfun main() { for (i in 1..3) { println(square(i)) } }",
        "fun main() { val name = readLine()\n println(\"hi \" + name) }",
        "fun main() { println(1 / 0) }",
    ];

    let config = InterpreterConfig::default().with_iteration_limit(100);
    let mut context = EvaluationContext::new("world\n".as_bytes(), std::io::stdout()).with_config(config);
    for (index, source) in program.into_iter().enumerate() {
        println!("{}: {:?}", index, context.evaluate_str(source));
    }

    Ok(())
}
