use clap::Parser;
use fir_compiler::compile_to_ir;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fir")]
#[command(about = "Compile a small typed scripting language to a flat JSON IR")]
struct Args {
    /// Path to the source file to compile
    file: Option<PathBuf>,

    /// Emit the IR as JSON. If none of --json/--text/--both is given, defaults to --json.
    #[arg(long)]
    json: bool,

    /// Emit the IR as readable text lines
    #[arg(long)]
    text: bool,

    /// Emit both forms
    #[arg(long)]
    both: bool,
}

fn main() {
    let args = Args::parse();

    let src = if let Some(file_path) = args.file {
        fs::read_to_string(&file_path).unwrap_or_else(|e| {
            eprintln!("Error reading file '{}': {}", file_path.display(), e);
            std::process::exit(1);
        })
    } else {
        DEFAULT_SAMPLE.trim().to_string()
    };

    // Determine outputs
    let mut want_json = args.json;
    let mut want_text = args.text;
    if args.both {
        want_json = true;
        want_text = true;
    }
    if !want_json && !want_text {
        want_json = true;
    } // default to JSON

    let program = compile_to_ir(&src).unwrap_or_else(|e| {
        eprintln!("Compilation error: {}", e);
        std::process::exit(1);
    });

    if want_text {
        for line in program.to_lines() {
            println!("{}", line);
        }
        if want_json {
            println!();
        }
    }

    if want_json {
        let json = serde_json::to_string_pretty(&program).unwrap_or_else(|e| {
            eprintln!("Serialization error: {}", e);
            std::process::exit(1);
        });
        println!("{}", json);
    }
}

const DEFAULT_SAMPLE: &str = r#"
let a = 1n;
let b = 2n;
let sum = a + b;
if (sum < 5n) {
    print(sum);
} else {
    print(0n);
}

for (let i = 0n; i < 3n; i = i + 1n) {
    print(i);
}

let y = scale(2, 3.5);
print(y);

function scale(x: number, f: number): number {
    return x * f;
}
"#;
