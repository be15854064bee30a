use obsact::{compile, compile_named, Backend, Phase};

use std::{fs, path::PathBuf};

pub fn path_to_test_resource(name: &'static str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("resources");
    path.push("test");
    path.push(name);
    path
}

fn read_test_resource(name: &'static str) -> String {
    fs::read_to_string(path_to_test_resource(name)).unwrap()
}

/// Líneas del programa generado que invocan primitivas, sin indentación
/// ni terminadores, omitiendo las definiciones de soporte.
fn primitive_calls(output: &str) -> Vec<String> {
    const PRIMITIVES: [&str; 4] = ["turn_on(", "turn_off(", "alert(", "alert_with_var("];

    output
        .lines()
        .map(|line| line.trim().trim_end_matches(';'))
        .filter(|line| PRIMITIVES.iter().any(|primitive| line.starts_with(primitive)))
        .map(String::from)
        .collect()
}

#[test]
fn compile_when_scenario_then_calls_in_source_order() {
    let source = read_test_resource("scenario.obs");

    for backend in [Backend::C, Backend::Python] {
        let output = compile(&source, backend).unwrap();

        let turn_on = output.find("turn_on(\"lampada\")").unwrap();
        let condition = output.find("temp > 30").unwrap();
        let turn_off = output.find("turn_off(\"lampada\")").unwrap();
        let alert = output.find("alert(\"lampada\", \"Oi\")").unwrap();

        assert!(turn_on < condition);
        assert!(condition < turn_off);
        assert!(turn_off < alert);
        assert!(output.ends_with('\n'));
    }
}

#[test]
fn compile_when_scenario_then_c_broadcast_alerts_every_device_in_order() {
    let output = compile(&read_test_resource("scenario.obs"), Backend::C).unwrap();

    assert_eq!(
        &primitive_calls(&output)[4..],
        ["alert(\"lampada\", \"Alo\")", "alert(\"sensor\", \"Alo\")"]
    );
}

#[test]
fn compile_when_undefined_device_then_single_semantic_diagnostic() {
    let source = read_test_resource("undefined_device.obs");

    for backend in [Backend::C, Backend::Python] {
        let diagnostics = compile_named(&source, "undefined_device.obs", backend).unwrap_err();

        assert_eq!(diagnostics.len(), 1);

        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.phase(), Phase::Semantic);
        assert_eq!(diagnostic.message(), "Device 'ventilador' does not exist.");
        assert_eq!(diagnostic.line(), 5);
    }
}

#[test]
fn compile_when_undefined_devices_everywhere_then_each_occurrence_reported() {
    let source = "dispositivos: lampada fimdispositivos
execute ligar em porta;
quando x > 1: execute desligar em janela senao alerta para porta: \"a\";
difundir: \"b\" -> [lampada, forno, janela];";

    let diagnostics = compile(source, Backend::C).unwrap_err();
    let messages: Vec<_> = diagnostics.iter().map(|error| error.message()).collect();

    assert_eq!(
        messages,
        [
            "Device 'porta' does not exist.",
            "Device 'janela' does not exist.",
            "Device 'porta' does not exist.",
            "Device 'forno' does not exist.",
            "Device 'janela' does not exist.",
        ]
    );

    let lines: Vec<_> = diagnostics.iter().map(|error| error.line()).collect();
    assert_eq!(lines, [2, 3, 3, 4, 4]);
}

#[test]
fn compile_when_lexical_error_then_fails_before_parsing() {
    let diagnostics = compile(&read_test_resource("bad_char.obs"), Backend::C).unwrap_err();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.iter().all(|error| error.phase() == Phase::Lexical));
    assert_eq!(diagnostics.iter().next().unwrap().line(), 2);
}

#[test]
fn compile_when_syntax_error_then_build_failed_rendering() {
    let diagnostics = compile_named(
        "dispositivos: lampada fimdispositivos\nexecute ligar lampada;",
        "rule.obs",
        Backend::Python,
    )
    .unwrap_err();

    assert_eq!(diagnostics.len(), 1);

    let rendered = diagnostics.to_string();
    assert!(rendered.starts_with("Syntax error: "));
    assert!(rendered.contains(" --> rule.obs:"));
    assert!(rendered.contains("2 | execute ligar lampada;\n"));
    assert!(rendered.ends_with("Build failed with 1 error\n"));
}

#[test]
fn compile_when_same_source_twice_then_byte_identical() {
    let source = read_test_resource("scenario.obs");

    for backend in [Backend::C, Backend::Python] {
        assert_eq!(
            compile(&source, backend).unwrap(),
            compile(&source, backend).unwrap()
        );
    }
}

#[test]
fn compile_when_no_broadcast_then_backends_call_same_primitives() {
    let source = "dispositivos: lampada sensor[temp] fimdispositivos
def limite = 25;
execute ligar em sensor;
alerta para lampada: \"Temperatura\", temp;
execute desligar em lampada;
alerta para sensor: \"C:\\dados\";";

    let c = compile(source, Backend::C).unwrap();
    let python = compile(source, Backend::Python).unwrap();

    let calls = primitive_calls(&c);
    assert_eq!(calls, primitive_calls(&python));
    assert_eq!(
        calls,
        [
            "turn_on(\"sensor\")",
            "alert_with_var(\"lampada\", \"Temperatura\", temp)",
            "turn_off(\"lampada\")",
            "alert(\"sensor\", \"C:\\\\dados\")",
        ]
    );
}

#[test]
fn compile_when_number_literal_then_same_digits() {
    let source = "dispositivos: lampada fimdispositivos\ndef x = 2147483647;\ndef y = 0;";

    let c = compile(source, Backend::C).unwrap();
    assert!(c.contains("int x = 2147483647;"));
    assert!(c.contains("int y = 0;"));

    let python = compile(source, Backend::Python).unwrap();
    assert!(python.contains("x = 2147483647\n"));
}

#[test]
fn compile_when_no_commands_then_unexpected_end_of_input() {
    let diagnostics = compile("dispositivos: lampada fimdispositivos", Backend::C).unwrap_err();

    assert_eq!(diagnostics.len(), 1);

    let diagnostic = diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.phase(), Phase::Syntax);
    assert!(diagnostic.message().starts_with("Unexpected end of input"));
    assert_eq!(diagnostic.line(), 1);
}

#[test]
fn compile_when_broadcast_variable_named_like_device_then_backends_call_same_primitives() {
    let source = "dispositivos: a b fimdispositivos
def _device = 7;
difundir: \"m\" _device -> [a, b];
alerta para a: \"x\", _device;";

    let c = compile(source, Backend::C).unwrap();
    let python = compile(source, Backend::Python).unwrap();

    let calls = primitive_calls(&c);
    assert_eq!(calls, primitive_calls(&python));
    assert_eq!(
        calls,
        [
            "alert_with_var(\"a\", \"m\", _device)",
            "alert_with_var(\"b\", \"m\", _device)",
            "alert_with_var(\"a\", \"x\", _device)",
        ]
    );
    assert!(!python.contains("for "));
}

#[test]
fn compile_when_read_before_first_def_then_declared_before_use() {
    let source = "dispositivos: lampada fimdispositivos
quando x > 1: execute ligar em lampada;
def x = 5;";

    let c = compile(source, Backend::C).unwrap();
    assert!(c.ends_with(
        "int main(void) {\n    \
         int x = 0;\n    \
         if (x > 1) {\n        \
         turn_on(\"lampada\");\n    \
         }\n    \
         x = 5;\n    \
         return 0;\n}\n"
    ));

    let python = compile(source, Backend::Python).unwrap();
    assert!(python.ends_with(
        "DEVICES = [\"lampada\"]\n\
         x = 0\n\
         \n\
         if x > 1:\n    \
         turn_on(\"lampada\")\n\
         x = 5\n"
    ));
}
