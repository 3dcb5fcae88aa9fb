pub(crate) mod check;
pub(crate) mod export_api_schema;


/// Prints `err` followed by the chain of its causes to stderr. Every line is
/// indented by `indent` spaces, causes one more step per level.
pub(crate) fn eprint_error(err: &anyhow::Error, indent: usize) {
    let pad = " ".repeat(indent);
    bunt::eprintln!("{}{$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", pad, err);

    for (depth, cause) in err.chain().skip(1).enumerate() {
        if depth == 0 {
            eprintln!();
            bunt::eprintln!("{}{$red+italic}Caused by:{/$}", pad);
        }
        eprintln!("{pad} {:width$}‣ {cause}", "", width = depth * 2);
    }
}
