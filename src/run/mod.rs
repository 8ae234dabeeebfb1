pub mod form_run;
