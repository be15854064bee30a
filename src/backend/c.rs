//! Backend de C.
//!
//! Todo el programa traducido queda dentro de `main()`. No se declara
//! ninguna variable más allá de las que introduce un `def`. Si una de
//! ellas se lee antes de su primer `def`, se declara en cero al inicio
//! de `main()` y todo `def` posterior solo asigna.

use crate::{
    codegen::{Context, Primitive},
    lex::Identifier,
    semantic::Symbols,
};

use std::fmt::{self, Write};

const RUNTIME: &str = r#"#include <stdbool.h>
#include <stdio.h>

void turn_on(const char *device) {
    printf("%s turned on!\n", device);
}

void turn_off(const char *device) {
    printf("%s turned off!\n", device);
}

void alert(const char *device, const char *message) {
    printf("%s received alert: %s\n", device, message);
}

void alert_with_var(const char *device, const char *message, int value) {
    printf("%s received alert: %s %d\n", device, message, value);
}

"#;

pub struct Emitter;

impl super::Emitter for Emitter {
    const TRUE: &'static str = "true";
    const FALSE: &'static str = "false";
    const AND: &'static str = "&&";

    fn prologue<W: Write>(cx: &mut Context<'_, W>, symbols: &Symbols) -> fmt::Result {
        cx.output().write_str(RUNTIME)?;
        emit!(cx, "int main(void) {{")?;

        cx.indent();
        for variable in symbols.hoisted() {
            emit!(cx, "int {} = 0;", variable)?;
        }

        Ok(())
    }

    fn epilogue<W: Write>(cx: &mut Context<'_, W>) -> fmt::Result {
        emit!(cx, "return 0;")?;

        cx.dedent();
        emit!(cx, "}}")
    }

    fn assign<W: Write>(
        cx: &mut Context<'_, W>,
        name: &Identifier,
        value: &str,
        first: bool,
    ) -> fmt::Result {
        // Redefinir con `int` en el mismo bloque no compilaría
        if first {
            emit!(cx, "int {} = {};", name, value)
        } else {
            emit!(cx, "{} = {};", name, value)
        }
    }

    fn begin_if<W: Write>(cx: &mut Context<'_, W>, condition: &str) -> fmt::Result {
        emit!(cx, "if ({}) {{", condition)?;

        cx.indent();
        Ok(())
    }

    fn begin_else<W: Write>(cx: &mut Context<'_, W>) -> fmt::Result {
        cx.dedent();
        emit!(cx, "}} else {{")?;

        cx.indent();
        Ok(())
    }

    fn end_if<W: Write>(cx: &mut Context<'_, W>) -> fmt::Result {
        cx.dedent();
        emit!(cx, "}}")
    }

    fn call<W: Write>(cx: &mut Context<'_, W>, primitive: Primitive, args: &[&str]) -> fmt::Result {
        emit!(cx, "{}({});", primitive, args.join(", "))
    }
}
