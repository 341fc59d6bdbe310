macro_rules! dispatch_target {
    ($type:ident: $target:expr => $expr:expr) => {{
        use crate::target::{Target, C, Pascal};

        match $target {
            Target::Pascal => {
                type $type = Pascal;
                $expr
            }

            Target::C => {
                type $type = C;
                $expr
            }
        }
    }};
}
