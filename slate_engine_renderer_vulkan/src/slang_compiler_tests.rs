use super::*;
use tempfile::TempDir;

fn arg_strings(compiler: &SlangCompiler, source: &str, output: &str) -> Vec<String> {
    compiler.arguments(Path::new(source), Path::new(output))
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn position_of(args: &[String], flag: &str) -> usize {
    args.iter().position(|a| a == flag).unwrap()
}

#[test]
fn test_arguments_target_spirv_1_5() {
    let compiler = SlangCompiler::new(Vec::new());
    let args = arg_strings(&compiler, "lit.slang", "lit.spv");

    assert_eq!(args[position_of(&args, "-target") + 1], "spirv");
    assert_eq!(args[position_of(&args, "-profile") + 1], "spirv_1_5");
    assert!(args.contains(&"-matrix-layout-column-major".to_string()));
    assert!(args.contains(&"-fvk-use-entrypoint-name".to_string()));
    assert!(args.contains(&"-emit-spirv-directly".to_string()));
}

#[test]
fn test_arguments_output_then_source_last() {
    let compiler = SlangCompiler::new(Vec::new());
    let args = arg_strings(&compiler, "lit.slang", "out/lit.spv");

    assert_eq!(args[position_of(&args, "-o") + 1], "out/lit.spv");
    assert_eq!(args.last().unwrap(), "lit.slang");
}

#[test]
fn test_arguments_include_every_search_path() {
    let compiler = SlangCompiler::new(vec![PathBuf::from("shaders/BuiltIn"), PathBuf::from("shaders/Lib")]);
    let args = arg_strings(&compiler, "a.slang", "a.spv");

    let includes: Vec<&String> = args.windows(2)
        .filter(|w| w[0] == "-I")
        .map(|w| &w[1])
        .collect();
    assert_eq!(includes, vec!["shaders/BuiltIn", "shaders/Lib"]);
}

#[test]
fn test_from_config_resolves_search_paths() {
    let config = EngineConfig {
        asset_root: PathBuf::from("/game"),
        ..EngineConfig::default()
    };
    let compiler = SlangCompiler::from_config(&config);
    assert_eq!(compiler.search_paths(), &[PathBuf::from("/game/shaders/BuiltIn")]);
}

#[test]
fn test_compile_missing_source_fails_at_module_stage() {
    let dir = TempDir::new().unwrap();
    let compiler = SlangCompiler::new(Vec::new()).with_scratch_directory(dir.path());

    let err = compiler.compile(&dir.path().join("missing.slang")).unwrap_err();
    assert_eq!(err.stage, CompileStage::Module);
    assert!(err.message.contains("missing.slang"));
}

#[test]
fn test_compile_without_compiler_reports_diagnostics() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("flat.slang");
    std::fs::write(&source, "float4 main() : SV_Target { return 1; }").unwrap();

    let compiler = SlangCompiler::new(Vec::new())
        .with_executable(dir.path().join("no-such-slangc"))
        .with_scratch_directory(dir.path());

    let err = compiler.compile(&source).unwrap_err();
    assert_eq!(err.stage, CompileStage::Module);
    assert!(err.message.contains("no-such-slangc"));
    // Nothing is left behind in the scratch directory
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
#[ignore] // Requires slangc
fn test_compile_with_slangc_reflects_push_constants() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("tint.slang");
    std::fs::write(&source, r#"
struct Tint { float4 color; float strength; };
[[vk::push_constant]] ConstantBuffer<Tint> tint;

[shader("fragment")]
float4 fragmentMain() : SV_Target { return tint.color * tint.strength; }
"#).unwrap();

    let compiler = SlangCompiler::new(Vec::new()).with_scratch_directory(dir.path());
    let program = compiler.compile(&source).unwrap();

    assert!(!program.code.is_empty());
    let tint = program.layout.parameter("tint").unwrap();
    assert_eq!(tint.type_layout.field("strength").unwrap().offset, 16);
}

#[test]
#[ignore] // Requires slangc
fn test_compile_with_slangc_skips_reflection_on_marker() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("raw.slang");
    std::fs::write(&source, r#"
#define NOREFLECT
[shader("fragment")]
float4 fragmentMain() : SV_Target { return float4(1.0); }
"#).unwrap();

    let compiler = SlangCompiler::new(Vec::new()).with_scratch_directory(dir.path());
    let program = compiler.compile(&source).unwrap();

    assert!(program.layout.parameters().is_empty());
}
