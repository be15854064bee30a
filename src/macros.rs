macro_rules! dispatch_backend {
    ($type:ident: $backend:expr => $expr:expr) => {{
        use crate::backend::{Backend, Python, C};

        match $backend {
            Backend::C => {
                type $type = C;
                $expr
            }

            Backend::Python => {
                type $type = Python;
                $expr
            }
        }
    }};
}

macro_rules! emit {
    ($context:expr, $($format:tt)*) => {
        $context.line(format_args!($($format)*))
    };
}
