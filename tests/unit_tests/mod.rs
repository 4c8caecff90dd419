use formwork::AssemblyError;

mod assembly;
mod element;

fn assembly_error(report: &eyre::Report) -> &AssemblyError {
    report
        .downcast_ref::<AssemblyError>()
        .expect("error should be an assembly error")
}
