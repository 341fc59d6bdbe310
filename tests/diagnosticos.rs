use pretty_assertions::assert_eq;
use traductor::{error::Phase, semantic::SemanticError, target::Target};

const CASES: &[(&str, &str)] = &[
    // Léxicos
    (
        "main() {\n  int a;\n  a = 12.;\n}",
        "Error lexico (3,9): caracter '.' incorrecto",
    ),
    (
        "main() {\n  int a;\n  a = 1 % 2;\n}",
        "Error lexico (3,9): caracter '%' incorrecto",
    ),
    (
        "main() {\n/* abierto",
        "Error lexico: fin de fichero inesperado",
    ),
    // Sintácticos
    (
        "",
        "Error sintactico: encontrado fin de fichero, esperaba 'double' 'int' 'main' ",
    ),
    (
        "a = 1;",
        "Error sintactico (1,1): encontrado 'a', esperaba 'double' 'int' 'main' ",
    ),
    (
        "Main() {\n}",
        "Error sintactico (1,1): encontrado 'Main', esperaba 'double' 'int' 'main' ",
    ),
    (
        "main()",
        "Error sintactico: encontrado fin de fichero, esperaba { ",
    ),
    (
        "main {\n}",
        "Error sintactico (1,6): encontrado '{', esperaba ( ",
    ),
    (
        "main() {\n  int a;\n",
        "Error sintactico: encontrado fin de fichero, esperaba { } 'double' 'int' identificador ",
    ),
    (
        "main() {\n  int a,;\n}",
        "Error sintactico (2,9): encontrado ';', esperaba identificador ",
    ),
    (
        "main() {\n  int a;\n  a = ;\n}",
        "Error sintactico (3,7): encontrado ';', esperaba numero entero identificador numero real ",
    ),
    (
        "main() {\n  int a;\n  a = (1);\n}",
        "Error sintactico (3,7): encontrado '(', esperaba numero entero identificador numero real ",
    ),
    (
        "main() {\n  int a;\n  a 1;\n}",
        "Error sintactico (3,5): encontrado '1', esperaba = ",
    ),
    (
        "main() {\n}\nmain() {\n}",
        "Error sintactico (3,1): encontrado 'main', esperaba fin de fichero ",
    ),
    // Semánticos
    (
        "main() {\n  int a;\n  a = b;\n}",
        "Error semantico (3,7): 'b' no ha sido declarado",
    ),
    (
        "main() {\n\t\ta = 1;\n}",
        "Error semantico (2,3): 'a' no ha sido declarado",
    ),
    (
        "main() {\n  int a;\n  a = b c;\n}",
        "Error semantico (3,7): 'b' no ha sido declarado",
    ),
    (
        "main() {\n  int a;\n  double a;\n}",
        "Error semantico (3,10): 'a' ya existe en este ambito",
    ),
    (
        "main() {\n  int var, var;\n}",
        "Error semantico (2,12): 'var' ya existe en este ambito",
    ),
    (
        "int f() {\n}\ndouble f() {\n}\nmain() {\n}",
        "Error semantico (3,8): 'f' ya existe en este ambito",
    ),
    (
        "int f() {\n}\nmain() {\n  int a;\n  a = f;\n}",
        "Error semantico (5,7): 'f' no es una variable",
    ),
    (
        "main() {\n  int v[3], a;\n  a = v;\n}",
        "Error semantico (3,7): 'v' no es una variable",
    ),
    (
        "main() {\n  int v[3];\n  v = 1;\n}",
        "Error semantico (3,3): 'v' no es una variable",
    ),
    (
        "main() {\n  int a;\n  a = 1.5;\n}",
        "Error semantico (3,3): 'a' debe ser de tipo real",
    ),
    (
        "main() {\n  int a;\n  double d;\n  a = a + d;\n}",
        "Error semantico (4,3): 'a' debe ser de tipo real",
    ),
    (
        "main() {\n  int v[00];\n}",
        "Error semantico (2,9): '00' debe ser mayor que cero",
    ),
];

#[test]
fn first_error_is_reported() {
    for (source, expected) in CASES {
        for target in [Target::Pascal, Target::C] {
            let diagnostic = traductor::translate(source, target).unwrap_err();
            assert_eq!(diagnostic.to_string(), *expected, "source: {:?}", source);
        }
    }
}

#[test]
fn diagnostic_keeps_phase_and_error() {
    let diagnostic = traductor::translate("main() {\n  a = 1;\n}", Target::Pascal).unwrap_err();

    assert_eq!(diagnostic.phase(), Phase::Semantic);
    assert_eq!(diagnostic.position().map(|p| (p.line(), p.column())), Some((2, 3)));
    assert!(matches!(
        diagnostic.error().downcast_ref::<SemanticError>(),
        Some(SemanticError::Undeclared(name)) if name.as_ref() == "a"
    ));
}

#[test]
fn positions_survive_blank_lines_and_functions() {
    let source = "int f() {\n}\n\nmain() {\n  int a, b; a = 1\n  b = 2;\n}";
    assert_eq!(
        traductor::translate(source, Target::Pascal).unwrap_err().to_string(),
        "Error sintactico (6,3): encontrado 'b', esperaba * / + - ; "
    );

    let source = format!("main() {{\n  int a;\n{}  a = c;\n}}", "\n".repeat(12));
    assert_eq!(
        traductor::translate(&source, Target::Pascal).unwrap_err().to_string(),
        "Error semantico (15,7): 'c' no ha sido declarado"
    );
}
