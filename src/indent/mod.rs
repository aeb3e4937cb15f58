crate::reexport!(indenter);
crate::reexport!(strategy);
crate::reexport!(source);
crate::reexport!(comment);
