#![allow(non_snake_case)]

use tomlin::{algebra::*, factor::*, gub::*, io::ConfigurablePrintTarget};

fn verbose_factor() -> Factorization<f64> {
    let settings = FactorSettingsBuilder::default().verbose(true).build().unwrap();
    Factorization::new(settings)
}

fn factorize_identity(factor: &mut Factorization<f64>) {
    let A = CscMatrix::identity(3);
    let mut flags = BasisFlags::new(3, 3);
    (0..3).for_each(|j| flags.set_column_basic(j, true));
    factor.factorize(&A, &mut flags).unwrap();
}

#[test]
fn test_print_to_stdout() {
    let mut factor = verbose_factor();
    factor.print_to_stdout();
    factorize_identity(&mut factor);
}

#[test]
fn test_print_to_buffer() {
    let mut factor = verbose_factor();
    factor.print_to_buffer();
    factorize_identity(&mut factor);
    let result = factor.get_print_buffer().unwrap();
    assert!(result.contains("factorize: rows = 3"));
}

#[test]
fn test_print_to_file() {
    use std::io::{Read, Seek};

    let mut factor = verbose_factor();
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut file2 = file.reopen().unwrap();
    factor.print_to_file(file.into_file());
    factorize_identity(&mut factor);

    file2.seek(std::io::SeekFrom::Start(0)).unwrap();
    let mut result = String::new();
    file2.read_to_string(&mut result).unwrap();
    assert!(result.contains("status = Ready"));
}

#[test]
fn test_print_to_stream() {
    use std::io::{Read, Seek};

    let A = CscMatrix::from(&[[1., 1.]]);
    let settings = GubSettingsBuilder::default().verbose(true).build().unwrap();
    let mut gub = GubMatrix::new(A, &[0], &[2], &[1.], &[1.], settings).unwrap();
    let mut model = SimplexModel::new(1, 2);
    model.cost = vec![1., 2.];

    let file = tempfile::NamedTempFile::new().unwrap();
    let mut file2 = file.reopen().unwrap();
    gub.print_to_stream(Box::new(file.into_file()));
    gub.use_effective_rhs(&mut model, true).unwrap();

    file2.seek(std::io::SeekFrom::Start(0)).unwrap();
    let mut result = String::new();
    file2.read_to_string(&mut result).unwrap();
    assert!(result.contains("set 0: key Slack -> Member(0)"));
    assert!(result.contains("1 of 1 sets keyed"));
}

#[test]
fn test_silent_by_default() {
    let mut factor = Factorization::<f64>::new(FactorSettings::default());
    factor.print_to_buffer();
    factorize_identity(&mut factor);
    assert!(factor.get_print_buffer().unwrap().is_empty());
}

#[test]
fn test_print_to_sink() {
    let mut factor = verbose_factor();
    factor.print_to_sink();
    factorize_identity(&mut factor);
    assert!(factor.get_print_buffer().is_err());
    assert!(factor.is_ready());
}
