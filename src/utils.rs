/// rounds up to the nearest multiple of ten. used for varchar widths and column padding.
pub fn roundup_ten(x: usize) -> usize {
    x.div_ceil(10) * 10
}

/// joins items `per_line` at a time with `,` and the resulting lines with `,\n`.
pub fn grouper<S: AsRef<str>>(items: &[S], per_line: usize) -> String {
    items
        .chunks(per_line.max(1))
        .map(|line| {
            line.iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

/// single-quotes each item and groups them, e.g. for an `IN (...)` list.
pub fn quote_list<S: AsRef<str>>(items: &[S], per_line: usize) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("'{}'", i.as_ref())).collect();
    grouper(&quoted, per_line)
}
